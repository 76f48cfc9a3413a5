// Use-case level inputs/outputs for the session task.

use crate::domain::{ConnectionId, Direction, EnemySnapshot, LobbyId, LobbyPhase, RosterSnapshot};
use tokio::sync::oneshot;

/// Position update as sent by a client.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    /// Player the client claims to move; must be the sender's own id.
    pub id: ConnectionId,
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    /// Informational only; the lobby is resolved from the connection index.
    pub lobby_id: Option<LobbyId>,
}

#[derive(Debug)]
pub enum SessionCommand {
    JoinLobby {
        conn_id: ConnectionId,
        lobby_id: LobbyId,
    },
    Ready {
        conn_id: ConnectionId,
        lobby_id: LobbyId,
    },
    Move {
        conn_id: ConnectionId,
        request: MoveRequest,
    },
    Disconnect {
        conn_id: ConnectionId,
    },
    ListLobbies {
        reply: oneshot::Sender<Vec<LobbySummary>>,
    },
}

/// Who receives a dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Specific connections, usually the members of one lobby.
    Connections(Vec<ConnectionId>),
    /// Every live connection regardless of lobby.
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LobbyUpdate { members: Vec<ConnectionId> },
    UpdatePositions(RosterSnapshot),
    StartGame(RosterSnapshot),
    PlayerMoved {
        id: ConnectionId,
        x: f64,
        y: f64,
        direction: Direction,
    },
    UpdateEnemy(EnemySnapshot),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySummary {
    pub lobby_id: LobbyId,
    pub members: Vec<ConnectionId>,
    pub ready: usize,
    pub phase: LobbyPhase,
}
