// Domain layer: session entities and rules, free of I/O.

pub mod enemy;
pub mod ids;
pub mod lobby;
pub mod player;
pub mod roster;
pub mod systems;
pub mod tuning;

pub use enemy::{Enemy, EnemySnapshot, Facing};
pub use ids::{ConnectionId, LobbyId};
pub use lobby::{Departure, Lobby, LobbyError, LobbyPhase, LobbyRegistry, ReadyOutcome};
pub use player::{Color, Direction, Player};
pub use roster::{PlayerRoster, RosterSnapshot};
