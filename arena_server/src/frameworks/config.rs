use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

const DEFAULT_ENEMY_TICK_MS: u64 = 100;

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn bind_addr() -> IpAddr {
    env::var("ARENA_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

// A zero period would make the interval panic, so it falls back to the default.
pub fn enemy_tick_interval() -> Duration {
    let millis = env::var("ENEMY_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(DEFAULT_ENEMY_TICK_MS);
    Duration::from_millis(millis)
}

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
// Per-connection queue of lobby traffic; a slow client loses messages past this point.
pub const OUTBOX_CAPACITY: usize = 256;
pub const GLOBAL_BROADCAST_CAPACITY: usize = 128;
