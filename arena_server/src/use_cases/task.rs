use crate::use_cases::ports::Broadcaster;
use crate::use_cases::session::SessionEngine;
use crate::use_cases::types::SessionCommand;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Single owner of all session state.
///
/// Connection commands and the enemy timer are multiplexed on one loop, so each command (and the
/// broadcasts it causes) completes before the next command or tick is looked at.
pub async fn session_task<B: Broadcaster>(
    mut command_rx: mpsc::Receiver<SessionCommand>,
    mut engine: SessionEngine<B>,
    enemy_tick_interval: Duration,
) {
    // The enemy runs from boot regardless of whether any lobby has started.
    let mut interval = tokio::time::interval(enemy_tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                match command {
                    Some(command) => engine.handle(command),
                    None => {
                        info!("session command channel closed; session task exiting");
                        break;
                    }
                }
            }
            _ = interval.tick() => {
                engine.tick_enemy();
            }
        }
    }
}
