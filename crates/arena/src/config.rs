//! Server configuration and environment overrides.

use std::str::FromStr;
use std::time::Duration;

use arena_room::{RoomConfig, TickPolicy};
use tracing::warn;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Default limit for a client to finish the WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default limit for one outgoing frame to be written.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to start a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub bind: String,
    pub room: RoomConfig,
    /// Close connections that send nothing for this long. `None` keeps
    /// quiet clients, e.g. spectators in the lobby, connected forever.
    pub idle_timeout: Option<Duration>,
    /// Sockets that have not completed the upgrade by then are dropped.
    pub handshake_timeout: Duration,
    /// A client that stops reading is closed once a write stalls this long.
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            room: RoomConfig::default(),
            idle_timeout: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the process environment.
    ///
    /// | Variable | Effect |
    /// |---|---|
    /// | `ARENA_BIND` | listen address |
    /// | `PORT` | listen on `0.0.0.0:$PORT` when `ARENA_BIND` is unset |
    /// | `ARENA_TICK_RATE` | simulation rate in Hz |
    /// | `ARENA_TICK_POLICY` | `skip` or `drop` |
    /// | `ARENA_SCOREBOARD_MS` | scoreboard period |
    /// | `ARENA_IDLE_TIMEOUT_SECS` | idle timeout, `0` disables |
    /// | `ARENA_HANDSHAKE_TIMEOUT_SECS` | upgrade handshake limit |
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = lookup("ARENA_BIND").filter(|b| !b.trim().is_empty()) {
            config.bind = bind.trim().to_string();
        } else if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
            config.bind = format!("0.0.0.0:{port}");
        }

        if let Some(rate) = parse_var::<u32>(&lookup, "ARENA_TICK_RATE") {
            config.room.tick_rate = rate;
        }

        if let Some(policy) = parse_var::<TickPolicy>(&lookup, "ARENA_TICK_POLICY") {
            config.room.tick_policy = policy;
        }

        match parse_var::<u64>(&lookup, "ARENA_SCOREBOARD_MS") {
            Some(0) => warn!("ARENA_SCOREBOARD_MS must be positive, keeping default"),
            Some(ms) => config.room.scoreboard_interval = Duration::from_millis(ms),
            None => {}
        }

        match parse_var::<u64>(&lookup, "ARENA_IDLE_TIMEOUT_SECS") {
            Some(0) => config.idle_timeout = None,
            Some(secs) => config.idle_timeout = Some(Duration::from_secs(secs)),
            None => {}
        }

        match parse_var::<u64>(&lookup, "ARENA_HANDSHAKE_TIMEOUT_SECS") {
            Some(0) => warn!("ARENA_HANDSHAKE_TIMEOUT_SECS must be positive, keeping default"),
            Some(secs) => config.handshake_timeout = Duration::from_secs(secs),
            None => {}
        }

        config
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}
