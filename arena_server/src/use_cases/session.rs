// Session engine: applies connection commands to lobby/roster state and emits the
// resulting broadcasts in the same step.

use crate::domain::systems::pursuit;
use crate::domain::tuning::enemy::EnemyTuning;
use crate::domain::tuning::player::PlayerTuning;
use crate::domain::{
    Color, ConnectionId, Departure, Direction, Enemy, EnemySnapshot, LobbyError, LobbyId,
    LobbyRegistry, Player, PlayerRoster, ReadyOutcome,
};
use crate::use_cases::ports::Broadcaster;
use crate::use_cases::types::{Audience, LobbySummary, MoveRequest, SessionCommand, SessionEvent};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Lobby(LobbyError),
    /// A connection tried to move a player other than its own.
    NotOwner,
    /// The move targets a player that is not in the roster.
    UnknownPlayer,
    /// Coordinates were NaN or infinite.
    InvalidPosition,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Lobby(e) => e.fmt(f),
            SessionError::NotOwner => f.write_str("Not allowed to move another player"),
            SessionError::UnknownPlayer => f.write_str("Unknown player"),
            SessionError::InvalidPosition => f.write_str("Invalid position"),
        }
    }
}

impl From<LobbyError> for SessionError {
    fn from(e: LobbyError) -> Self {
        SessionError::Lobby(e)
    }
}

/// Owns the lobby registry, the player roster and the enemy.
///
/// Every method finishes its mutation and its dispatches before returning, so callers that
/// serialize access (the session task) never expose half-applied state.
pub struct SessionEngine<B> {
    lobbies: LobbyRegistry,
    roster: PlayerRoster,
    enemy: Enemy,
    player_tuning: PlayerTuning,
    broadcaster: B,
}

impl<B: Broadcaster> SessionEngine<B> {
    pub fn new(broadcaster: B, player_tuning: PlayerTuning, enemy_tuning: EnemyTuning) -> Self {
        Self {
            lobbies: LobbyRegistry::new(),
            roster: PlayerRoster::new(),
            enemy: Enemy::new(enemy_tuning),
            player_tuning,
            broadcaster,
        }
    }

    pub fn lobbies(&self) -> &LobbyRegistry {
        &self.lobbies
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    /// Applies one command. Failures are logged and, where the client needs to know, reported
    /// back to the sender only.
    pub fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::JoinLobby { conn_id, lobby_id } => {
                if let Err(e) = self.join_lobby(&conn_id, &lobby_id) {
                    warn!(conn_id = %conn_id, lobby_id = %lobby_id, error = %e, "join rejected");
                    self.notify_error(&conn_id, &e);
                }
            }
            SessionCommand::Ready { conn_id, lobby_id } => {
                if let Err(e) = self.mark_ready(&conn_id, &lobby_id) {
                    // Ready after start (or for a foreign lobby) carries no meaning; drop it.
                    debug!(conn_id = %conn_id, lobby_id = %lobby_id, error = %e, "ready ignored");
                }
            }
            SessionCommand::Move { conn_id, request } => match self.move_player(&conn_id, request) {
                Ok(()) => {}
                Err(SessionError::NotOwner) => {
                    warn!(conn_id = %conn_id, "move for foreign player rejected");
                    self.notify_error(&conn_id, &SessionError::NotOwner);
                }
                Err(e) => {
                    debug!(conn_id = %conn_id, error = %e, "move ignored");
                }
            },
            SessionCommand::Disconnect { conn_id } => {
                self.disconnect(&conn_id);
            }
            SessionCommand::ListLobbies { reply } => {
                // The requester may have given up waiting; nothing to do then.
                let _ = reply.send(self.lobby_summaries());
            }
        }
    }

    /// Adds the connection to the lobby and spawns its player.
    pub fn join_lobby(
        &mut self,
        conn_id: &ConnectionId,
        lobby_id: &LobbyId,
    ) -> Result<(), SessionError> {
        // Parity is taken over the whole roster before this player is inserted.
        let color = Color::for_join(self.roster.len());
        let members = self.lobbies.join(lobby_id, conn_id.clone())?.members().to_vec();

        self.roster.insert(Player::spawn(
            conn_id.clone(),
            color,
            self.player_tuning.spawn_x,
            self.player_tuning.spawn_y,
        ));
        info!(
            conn_id = %conn_id,
            lobby_id = %lobby_id,
            members = members.len(),
            "player joined lobby"
        );

        self.broadcast_membership(members);
        Ok(())
    }

    /// Records a ready signal; starts the session once everybody is ready.
    pub fn mark_ready(
        &mut self,
        conn_id: &ConnectionId,
        lobby_id: &LobbyId,
    ) -> Result<ReadyOutcome, SessionError> {
        let outcome = self.lobbies.mark_ready(lobby_id, conn_id)?;

        match &outcome {
            ReadyOutcome::Waiting { ready, members } => {
                debug!(conn_id = %conn_id, lobby_id = %lobby_id, ready, members, "player ready");
            }
            ReadyOutcome::Started { members } => self.start_session(lobby_id, members),
        }

        Ok(outcome)
    }

    /// Applies a client-reported position to the sender's own player and relays it to its lobby.
    pub fn move_player(
        &mut self,
        conn_id: &ConnectionId,
        request: MoveRequest,
    ) -> Result<(), SessionError> {
        if request.id != *conn_id {
            return Err(SessionError::NotOwner);
        }
        if !request.x.is_finite() || !request.y.is_finite() {
            return Err(SessionError::InvalidPosition);
        }
        if !self
            .roster
            .set_position(&request.id, request.x, request.y, request.direction)
        {
            return Err(SessionError::UnknownPlayer);
        }

        let lobby = self
            .lobbies
            .lobby_of(conn_id)
            .and_then(|lobby_id| self.lobbies.get(lobby_id));
        if let Some(lobby) = lobby {
            if request.lobby_id.as_ref().is_some_and(|id| id != lobby.id()) {
                debug!(conn_id = %conn_id, lobby_id = %lobby.id(), "move names a different lobby");
            }
            self.broadcaster.dispatch(
                &Audience::Connections(lobby.members().to_vec()),
                &SessionEvent::PlayerMoved {
                    id: request.id,
                    x: request.x,
                    y: request.y,
                    direction: request.direction,
                },
            );
        }
        Ok(())
    }

    /// Removes the connection from its lobby and the roster. No-op for connections that never
    /// joined.
    pub fn disconnect(&mut self, conn_id: &ConnectionId) -> Option<Departure> {
        let departure = self.lobbies.remove_member(conn_id)?;
        self.roster.remove(conn_id);
        info!(
            conn_id = %conn_id,
            lobby_id = %departure.lobby_id,
            remaining = departure.remaining.len(),
            reaped = departure.reaped,
            started = departure.started,
            "player left lobby"
        );

        if !departure.remaining.is_empty() {
            self.broadcast_membership(departure.remaining.clone());
        }
        if departure.started {
            self.start_session(&departure.lobby_id, &departure.remaining);
        }
        Some(departure)
    }

    /// Advances the enemy one step toward the nearest player and tells every connection.
    ///
    /// Returns false when the roster is empty; nothing moves and nothing is sent.
    pub fn tick_enemy(&mut self) -> bool {
        if !pursuit::tick_enemy(&mut self.enemy, self.roster.iter()) {
            return false;
        }
        self.broadcaster.dispatch(
            &Audience::All,
            &SessionEvent::UpdateEnemy(EnemySnapshot::from(&self.enemy)),
        );
        true
    }

    pub fn lobby_summaries(&self) -> Vec<LobbySummary> {
        let mut summaries: Vec<LobbySummary> = self
            .lobbies
            .iter()
            .map(|lobby| LobbySummary {
                lobby_id: lobby.id().clone(),
                members: lobby.members().to_vec(),
                ready: lobby.ready_count(),
                phase: lobby.phase(),
            })
            .collect();
        summaries.sort_by(|a, b| a.lobby_id.cmp(&b.lobby_id));
        summaries
    }

    // Lines members up in join order, recolors them and tells the lobby the game is on.
    fn start_session(&mut self, lobby_id: &LobbyId, members: &[ConnectionId]) {
        let tuning = self.player_tuning;
        for (index, id) in members.iter().enumerate() {
            self.roster.insert(Player {
                id: id.clone(),
                color: Color::for_start_index(index),
                x: index as f64 * tuning.start_spacing + tuning.spawn_x,
                y: tuning.spawn_y,
                direction: Direction::Down,
            });
        }
        info!(lobby_id = %lobby_id, players = members.len(), "game started");

        let snapshot = self.roster.snapshot_of(members);
        self.broadcaster.dispatch(
            &Audience::Connections(members.to_vec()),
            &SessionEvent::StartGame(snapshot),
        );
    }

    fn broadcast_membership(&self, members: Vec<ConnectionId>) {
        let snapshot = self.roster.snapshot_of(&members);
        let audience = Audience::Connections(members.clone());
        self.broadcaster
            .dispatch(&audience, &SessionEvent::LobbyUpdate { members });
        self.broadcaster
            .dispatch(&audience, &SessionEvent::UpdatePositions(snapshot));
    }

    fn notify_error(&self, conn_id: &ConnectionId, error: &SessionError) {
        self.broadcaster.dispatch(
            &Audience::Connections(vec![conn_id.clone()]),
            &SessionEvent::Error {
                message: error.to_string(),
            },
        );
    }
}
