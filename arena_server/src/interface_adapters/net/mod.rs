// Network adapter modules split by client sockets vs read-only HTTP routes.

pub mod client;
pub mod internal;

pub use client::ws_handler;
pub use internal::list_lobbies_handler;
