//! # Arena
//!
//! Authoritative server for a multiplayer rocket arena shooter.
//!
//! Browser clients connect over WebSocket, join with a name and a
//! character, and from then on report movement, fire rockets and chat.
//! The server owns everything that decides the match: projectile flight,
//! hits, splash damage, rocket jumps, deaths, respawns and the scoreboard.
//!
//! The crate wires the layers together:
//!
//! - `arena-transport` accepts WebSocket connections
//! - `arena-protocol` decodes client events and encodes server events
//! - `arena-room` runs the single arena actor that owns the world
//! - `arena-sim` is the game itself, free of I/O
//! - `arena-tick` (used by the room) drives the fixed simulation step
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arena::prelude::*;
//!
//! # async fn start() -> Result<(), ArenaError> {
//! let server = ArenaServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_BIND, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_WRITE_TIMEOUT, ServerConfig};
pub use error::ArenaError;
pub use server::{ArenaServer, ArenaServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{ArenaError, ArenaServer, ArenaServerBuilder, ServerConfig};
    pub use arena_protocol::{ClientEvent, DVec3, GameConfig, PlayerId, ServerEvent};
    pub use arena_room::{ArenaHandle, ArenaInfo, RoomConfig};
    pub use arena_sim::World;
}
