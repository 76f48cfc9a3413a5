// Use cases layer: the session engine and the task that owns it.

pub mod ports;
pub mod session;
pub mod task;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use ports::Broadcaster;
pub use session::{SessionEngine, SessionError};
pub use task::session_task;
pub use types::{Audience, LobbySummary, MoveRequest, SessionCommand, SessionEvent};
