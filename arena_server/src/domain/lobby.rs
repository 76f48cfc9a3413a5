// Lobby membership, readiness and the connection -> lobby index.

use crate::domain::ids::{ConnectionId, LobbyId};
use std::collections::HashMap;
use std::fmt;

/// Lobby lifecycle. There is no way back from `Started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyPhase {
    Open,
    Started,
}

#[derive(Debug, Clone)]
pub struct Lobby {
    id: LobbyId,
    // Join order; drives start positions and colors.
    members: Vec<ConnectionId>,
    // Every ready signal is kept, repeats included.
    ready: Vec<ConnectionId>,
    started: bool,
}

impl Lobby {
    fn new(id: LobbyId) -> Self {
        Self {
            id,
            members: Vec::new(),
            ready: Vec::new(),
            started: false,
        }
    }

    pub fn id(&self) -> &LobbyId {
        &self.id
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn phase(&self) -> LobbyPhase {
        if self.started {
            LobbyPhase::Started
        } else {
            LobbyPhase::Open
        }
    }
}

/// Errors returned by lobby registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyError {
    /// The lobby's session is already running and accepts no new members.
    AlreadyStarted,
    /// The connection already belongs to a lobby.
    AlreadyMember { lobby_id: LobbyId },
    /// The connection is not a member of the targeted lobby.
    NotMember,
    /// No lobby with that id exists.
    UnknownLobby,
}

impl fmt::Display for LobbyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobbyError::AlreadyStarted => f.write_str("Game has already started"),
            LobbyError::AlreadyMember { lobby_id } => {
                write!(f, "Already in lobby {lobby_id}")
            }
            LobbyError::NotMember => f.write_str("Not a member of this lobby"),
            LobbyError::UnknownLobby => f.write_str("Lobby not found"),
        }
    }
}

/// Result of a ready signal that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Not everyone is ready yet.
    Waiting { ready: usize, members: usize },
    /// This signal started the session; members are listed in join order.
    Started { members: Vec<ConnectionId> },
}

/// What is left of a lobby after a member departs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub lobby_id: LobbyId,
    pub remaining: Vec<ConnectionId>,
    /// True when the lobby became empty and was dropped from the registry.
    pub reaped: bool,
    /// True when everyone left behind had already signalled ready, so the departure started the
    /// session. `remaining` is then the start order.
    pub started: bool,
}

/// Owns every lobby plus the reverse index used to find a connection's lobby.
///
/// Both maps are only changed together inside the methods below.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    lobbies: HashMap<LobbyId, Lobby>,
    membership: HashMap<ConnectionId, LobbyId>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }

    pub fn get(&self, lobby_id: &LobbyId) -> Option<&Lobby> {
        self.lobbies.get(lobby_id)
    }

    pub fn lobby_of(&self, conn_id: &ConnectionId) -> Option<&LobbyId> {
        self.membership.get(conn_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lobby> {
        self.lobbies.values()
    }

    /// Adds `conn_id` to the lobby, creating the lobby on first use.
    pub fn join(&mut self, lobby_id: &LobbyId, conn_id: ConnectionId) -> Result<&Lobby, LobbyError> {
        if self.lobbies.get(lobby_id).is_some_and(Lobby::is_started) {
            return Err(LobbyError::AlreadyStarted);
        }
        if let Some(current) = self.membership.get(&conn_id) {
            return Err(LobbyError::AlreadyMember {
                lobby_id: current.clone(),
            });
        }

        self.membership.insert(conn_id.clone(), lobby_id.clone());
        let lobby = self
            .lobbies
            .entry(lobby_id.clone())
            .or_insert_with(|| Lobby::new(lobby_id.clone()));
        lobby.members.push(conn_id);
        Ok(lobby)
    }

    /// Records a ready signal and starts the lobby once the ready count matches the member count.
    pub fn mark_ready(
        &mut self,
        lobby_id: &LobbyId,
        conn_id: &ConnectionId,
    ) -> Result<ReadyOutcome, LobbyError> {
        let lobby = self
            .lobbies
            .get_mut(lobby_id)
            .ok_or(LobbyError::UnknownLobby)?;
        if lobby.started {
            return Err(LobbyError::AlreadyStarted);
        }
        if !lobby.members.contains(conn_id) {
            return Err(LobbyError::NotMember);
        }

        lobby.ready.push(conn_id.clone());
        if lobby.ready.len() == lobby.members.len() {
            lobby.started = true;
            return Ok(ReadyOutcome::Started {
                members: lobby.members.clone(),
            });
        }

        Ok(ReadyOutcome::Waiting {
            ready: lobby.ready.len(),
            members: lobby.members.len(),
        })
    }

    /// Removes the connection from its lobby, if any, and reaps the lobby when it empties.
    ///
    /// Dropping the member's ready entries can leave every remaining member ready; the lobby
    /// starts right here in that case.
    pub fn remove_member(&mut self, conn_id: &ConnectionId) -> Option<Departure> {
        let lobby_id = self.membership.remove(conn_id)?;
        let lobby = self.lobbies.get_mut(&lobby_id)?;

        lobby.members.retain(|id| id != conn_id);
        lobby.ready.retain(|id| id != conn_id);
        let remaining = lobby.members.clone();

        let reaped = remaining.is_empty();
        // Ready entries never exceed the members while the lobby is open.
        let started = !reaped && !lobby.started && lobby.ready.len() == lobby.members.len();
        if started {
            lobby.started = true;
        }
        if reaped {
            self.lobbies.remove(&lobby_id);
        }

        Some(Departure {
            lobby_id,
            remaining,
            reaped,
            started,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::from(id)
    }

    fn lobby(id: &str) -> LobbyId {
        LobbyId::from(id)
    }

    #[test]
    fn when_lobby_is_unseen_then_join_creates_it_with_member_in_join_order() {
        let mut registry = LobbyRegistry::new();

        registry.join(&lobby("abc"), conn("a")).expect("first join");
        let joined = registry.join(&lobby("abc"), conn("b")).expect("second join");

        assert_eq!(joined.members(), &[conn("a"), conn("b")]);
        assert_eq!(joined.phase(), LobbyPhase::Open);
        assert_eq!(registry.lobby_of(&conn("b")), Some(&lobby("abc")));
    }

    #[test]
    fn when_lobby_has_started_then_join_is_rejected_and_membership_is_unchanged() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");
        registry.mark_ready(&lobby("abc"), &conn("a")).expect("ready");

        let result = registry.join(&lobby("abc"), conn("late"));

        assert_eq!(result.err(), Some(LobbyError::AlreadyStarted));
        let current = registry.get(&lobby("abc")).expect("lobby exists");
        assert_eq!(current.members(), &[conn("a")]);
        assert_eq!(registry.lobby_of(&conn("late")), None);
    }

    #[test]
    fn when_connection_is_already_in_a_lobby_then_second_join_is_rejected() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("one"), conn("a")).expect("join");

        let result = registry.join(&lobby("two"), conn("a"));

        assert_eq!(
            result.err(),
            Some(LobbyError::AlreadyMember {
                lobby_id: lobby("one")
            })
        );
        assert!(registry.get(&lobby("two")).is_none());
    }

    #[test]
    fn when_ready_count_reaches_member_count_then_lobby_starts_exactly_once() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");
        registry.join(&lobby("abc"), conn("b")).expect("join");

        let first = registry.mark_ready(&lobby("abc"), &conn("a"));
        assert_eq!(
            first,
            Ok(ReadyOutcome::Waiting {
                ready: 1,
                members: 2
            })
        );
        assert!(!registry.get(&lobby("abc")).expect("lobby").is_started());

        let second = registry.mark_ready(&lobby("abc"), &conn("b"));
        assert_eq!(
            second,
            Ok(ReadyOutcome::Started {
                members: vec![conn("a"), conn("b")]
            })
        );

        // Started is terminal; later signals are refused.
        let third = registry.mark_ready(&lobby("abc"), &conn("a"));
        assert_eq!(third, Err(LobbyError::AlreadyStarted));
        assert_eq!(
            registry.get(&lobby("abc")).expect("lobby").phase(),
            LobbyPhase::Started
        );
    }

    #[test]
    fn when_member_signals_ready_twice_then_repeats_count_toward_start() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");
        registry.join(&lobby("abc"), conn("b")).expect("join");

        registry.mark_ready(&lobby("abc"), &conn("a")).expect("ready");
        let outcome = registry.mark_ready(&lobby("abc"), &conn("a"));

        assert!(matches!(outcome, Ok(ReadyOutcome::Started { .. })));
    }

    #[test]
    fn when_non_member_signals_ready_then_it_is_refused() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");

        assert_eq!(
            registry.mark_ready(&lobby("abc"), &conn("stranger")),
            Err(LobbyError::NotMember)
        );
        assert_eq!(
            registry.mark_ready(&lobby("nope"), &conn("a")),
            Err(LobbyError::UnknownLobby)
        );
        assert_eq!(registry.get(&lobby("abc")).expect("lobby").ready_count(), 0);
    }

    #[test]
    fn when_mid_lobby_member_departs_then_index_and_ready_entries_are_cleared() {
        let mut registry = LobbyRegistry::new();
        for id in ["a", "b", "c"] {
            registry.join(&lobby("abc"), conn(id)).expect("join");
        }
        registry.mark_ready(&lobby("abc"), &conn("b")).expect("ready");

        let departure = registry.remove_member(&conn("b")).expect("b was a member");

        assert_eq!(departure.lobby_id, lobby("abc"));
        assert_eq!(departure.remaining, vec![conn("a"), conn("c")]);
        assert!(!departure.reaped);
        assert!(!departure.started);
        assert_eq!(registry.lobby_of(&conn("b")), None);
        assert_eq!(registry.get(&lobby("abc")).expect("lobby").ready_count(), 0);
    }

    #[test]
    fn when_ready_members_remain_after_departure_then_session_starts() {
        let mut registry = LobbyRegistry::new();
        for id in ["a", "b", "c"] {
            registry.join(&lobby("abc"), conn(id)).expect("join");
        }
        registry.mark_ready(&lobby("abc"), &conn("a")).expect("ready");
        registry.mark_ready(&lobby("abc"), &conn("b")).expect("ready");

        let departure = registry.remove_member(&conn("c")).expect("c was a member");

        assert!(departure.started);
        assert!(!departure.reaped);
        assert_eq!(departure.remaining, vec![conn("a"), conn("b")]);
        let current = registry.get(&lobby("abc")).expect("lobby");
        assert_eq!(current.phase(), LobbyPhase::Started);
        assert_eq!(
            registry.mark_ready(&lobby("abc"), &conn("a")),
            Err(LobbyError::AlreadyStarted)
        );
    }

    #[test]
    fn when_started_lobby_loses_a_member_then_it_does_not_start_again() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");
        registry.join(&lobby("abc"), conn("b")).expect("join");
        registry.mark_ready(&lobby("abc"), &conn("a")).expect("ready");
        registry.mark_ready(&lobby("abc"), &conn("b")).expect("ready");

        let departure = registry.remove_member(&conn("b")).expect("member");

        assert!(!departure.started);
        assert!(registry.get(&lobby("abc")).expect("lobby").is_started());
    }

    #[test]
    fn when_last_member_departs_then_lobby_is_reaped() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");
        registry.mark_ready(&lobby("abc"), &conn("a")).expect("ready");

        let departure = registry.remove_member(&conn("a")).expect("member");

        assert!(departure.reaped);
        assert!(!departure.started);
        assert!(registry.is_empty());
        // A reaped id can be reused for a fresh, open lobby.
        let fresh = registry.join(&lobby("abc"), conn("b")).expect("join");
        assert_eq!(fresh.phase(), LobbyPhase::Open);
    }

    #[test]
    fn when_unknown_connection_departs_then_nothing_happens() {
        let mut registry = LobbyRegistry::new();
        registry.join(&lobby("abc"), conn("a")).expect("join");

        assert_eq!(registry.remove_member(&conn("ghost")), None);
        assert_eq!(registry.len(), 1);
    }
}
