// Gameplay tuning, kept apart from runtime/server configuration.

pub mod enemy;
pub mod player;
