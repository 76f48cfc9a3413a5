// Process-wide player roster keyed by connection id.

use crate::domain::ids::ConnectionId;
use crate::domain::player::{Direction, Player};
use std::collections::{BTreeMap, HashMap};

/// Immutable copy of player state handed to the broadcaster.
pub type RosterSnapshot = BTreeMap<ConnectionId, Player>;

#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: HashMap<ConnectionId, Player>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.players.contains_key(id)
    }

    /// Inserts or replaces the player keyed by `player.id`.
    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id.clone(), player);
    }

    /// Updates position and facing. No bounds are applied; clients clamp to their viewport.
    ///
    /// Returns false when the id is not in the roster.
    pub fn set_position(&mut self, id: &ConnectionId, x: f64, y: f64, direction: Direction) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.x = x;
                player.y = y;
                player.direction = direction;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn snapshot_all(&self) -> RosterSnapshot {
        self.players
            .iter()
            .map(|(id, player)| (id.clone(), player.clone()))
            .collect()
    }

    /// Snapshot restricted to the given ids; ids without a player are skipped.
    pub fn snapshot_of<'a>(&self, ids: impl IntoIterator<Item = &'a ConnectionId>) -> RosterSnapshot {
        ids.into_iter()
            .filter_map(|id| self.players.get(id).map(|p| (id.clone(), p.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::player::Color;

    fn roster_with(ids: &[&str]) -> PlayerRoster {
        let mut roster = PlayerRoster::new();
        for id in ids {
            roster.insert(Player::spawn(ConnectionId::from(*id), Color::Red, 100.0, 100.0));
        }
        roster
    }

    #[test]
    fn when_position_is_set_for_known_player_then_state_is_updated() {
        let mut roster = roster_with(&["a"]);
        let id = ConnectionId::from("a");

        assert!(roster.set_position(&id, -50.0, 9000.0, Direction::Left));

        let player = roster.get(&id).expect("player should exist");
        assert_eq!((player.x, player.y), (-50.0, 9000.0));
        assert_eq!(player.direction, Direction::Left);
    }

    #[test]
    fn when_position_is_set_for_unknown_player_then_nothing_changes() {
        let mut roster = roster_with(&["a"]);

        assert!(!roster.set_position(&ConnectionId::from("ghost"), 1.0, 1.0, Direction::Up));
        assert_eq!(roster.len(), 1);
        assert!(!roster.contains(&ConnectionId::from("ghost")));
    }

    #[test]
    fn when_snapshot_is_taken_then_later_mutations_do_not_leak_into_it() {
        let mut roster = roster_with(&["a", "b"]);
        let snapshot = roster.snapshot_all();

        roster.set_position(&ConnectionId::from("a"), 5.0, 5.0, Direction::Up);
        roster.remove(&ConnectionId::from("b"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&ConnectionId::from("a")].x, 100.0);
    }

    #[test]
    fn when_snapshot_is_scoped_then_only_requested_players_are_included() {
        let roster = roster_with(&["a", "b", "c"]);
        let ids = [ConnectionId::from("a"), ConnectionId::from("missing")];

        let snapshot = roster.snapshot_of(&ids);

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&ConnectionId::from("a")));
    }
}
