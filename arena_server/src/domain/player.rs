// Player avatar state owned by the roster.

use crate::domain::ids::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    /// Color handed out on join: alternates with the roster size before insertion.
    ///
    /// The roster is process-wide, so the parity counts players in every lobby.
    pub fn for_join(roster_len: usize) -> Self {
        if roster_len % 2 == 0 {
            Color::Red
        } else {
            Color::Blue
        }
    }

    /// Color assigned when a session starts: the first member is red, everyone else blue.
    ///
    /// This intentionally disagrees with `for_join`; clients rely on the start-time value.
    pub fn for_start_index(index: usize) -> Self {
        if index == 0 { Color::Red } else { Color::Blue }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: ConnectionId,
    pub color: Color,
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
}

impl Player {
    pub fn spawn(id: ConnectionId, color: Color, x: f64, y: f64) -> Self {
        Self {
            id,
            color,
            x,
            y,
            direction: Direction::default(),
        }
    }
}
