use crate::interface_adapters::hub::ConnectionHub;
use crate::use_cases::SessionCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Commands flowing from connections into the session task.
    pub command_tx: mpsc::Sender<SessionCommand>,
    // Outbound fan-out shared with the session task.
    pub hub: Arc<ConnectionHub>,
}
