/// Gameplay tuning for player avatars.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Where a player appears when it joins a lobby.
    pub spawn_x: f64,
    pub spawn_y: f64,

    /// Horizontal gap between players when a session starts (x = index * spacing + spawn_x).
    pub start_spacing: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            spawn_x: 100.0,
            spawn_y: 100.0,
            start_spacing: 200.0,
        }
    }
}
