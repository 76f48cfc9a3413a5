use crate::domain::enemy::{Enemy, Facing};
use crate::domain::player::Player;
use std::f64::consts::FRAC_PI_4;

/// Returns the player closest to `(x, y)` by Euclidean distance.
///
/// Ties keep the first player seen.
pub fn nearest_player<'a>(
    players: impl IntoIterator<Item = &'a Player>,
    x: f64,
    y: f64,
) -> Option<&'a Player> {
    let mut nearest: Option<(&Player, f64)> = None;
    for player in players {
        let distance = (player.x - x).hypot(player.y - y);
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((player, distance)),
        }
    }
    nearest.map(|(player, _)| player)
}

/// Maps a bearing (radians, as returned by `atan2`) to one of four 90 degree sectors.
///
/// Sectors are half-open: right `[-pi/4, pi/4)`, front `[pi/4, 3pi/4)`, back `[-3pi/4, -pi/4)`,
/// left everything else.
pub fn facing_for_angle(angle: f64) -> Facing {
    if (-FRAC_PI_4..FRAC_PI_4).contains(&angle) {
        Facing::Right
    } else if (FRAC_PI_4..3.0 * FRAC_PI_4).contains(&angle) {
        Facing::Front
    } else if (-3.0 * FRAC_PI_4..-FRAC_PI_4).contains(&angle) {
        Facing::Back
    } else {
        Facing::Left
    }
}

/// Moves the enemy `speed` pixels toward the nearest player and updates its facing.
///
/// Returns false (and leaves the enemy untouched) when there is nobody to chase.
pub fn tick_enemy<'a>(enemy: &mut Enemy, players: impl IntoIterator<Item = &'a Player>) -> bool {
    let Some(target) = nearest_player(players, enemy.x, enemy.y) else {
        return false;
    };

    let angle = (target.y - enemy.y).atan2(target.x - enemy.x);
    enemy.x += enemy.speed * angle.cos();
    enemy.y += enemy.speed * angle.sin();
    enemy.facing = facing_for_angle(angle);
    true
}
