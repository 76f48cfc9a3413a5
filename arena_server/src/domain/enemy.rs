// The single scripted enemy shared by every lobby.

use crate::domain::tuning::enemy::EnemyTuning;

/// Which sprite row the enemy shows. `Front` faces the camera (moving down), `Back` away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub speed: f64,
    pub facing: Facing,
}

impl Enemy {
    pub fn new(tuning: EnemyTuning) -> Self {
        Self {
            x: tuning.spawn_x,
            y: tuning.spawn_y,
            radius: tuning.radius,
            speed: tuning.speed,
            facing: Facing::Left,
        }
    }
}

impl Default for Enemy {
    fn default() -> Self {
        Self::new(EnemyTuning::default())
    }
}

/// Wire-facing copy of the enemy state after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemySnapshot {
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
}

impl From<&Enemy> for EnemySnapshot {
    fn from(enemy: &Enemy) -> Self {
        Self {
            x: enemy.x,
            y: enemy.y,
            facing: enemy.facing,
        }
    }
}
