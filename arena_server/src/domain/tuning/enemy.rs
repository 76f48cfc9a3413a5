/// Gameplay tuning for the scripted enemy.

#[derive(Debug, Clone, Copy)]
pub struct EnemyTuning {
    /// Position at process boot.
    pub spawn_x: f64,
    pub spawn_y: f64,

    /// Collision radius in pixels. Only reported, the server does no hit checks.
    pub radius: f64,

    /// Distance covered per tick in pixels.
    pub speed: f64,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            spawn_x: 1200.0,
            spawn_y: 220.0,
            radius: 50.0,
            speed: 10.0,
        }
    }
}
