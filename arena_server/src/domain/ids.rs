// Identifier newtypes shared across the session engine.

use std::fmt;

/// Transport-assigned identity of a single WebSocket connection.
///
/// A connection's player entity is keyed by the same value, so this doubles as the player id on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generates a fresh, process-unique connection id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-chosen lobby name. Not checked for uniqueness: joining an unseen id creates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LobbyId(String);

impl LobbyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LobbyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LobbyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
