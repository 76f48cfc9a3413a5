// Interface adapters: wire protocol, connection fan-out and network handling.

pub mod http;
pub mod hub;
pub mod net;
pub mod protocol;
pub mod state;
