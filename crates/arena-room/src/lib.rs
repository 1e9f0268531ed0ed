//! The arena actor for the rocket arena server.
//!
//! One Tokio task owns the whole game: the [`World`](arena_sim::World),
//! the tick scheduler, the scoreboard cadence, and the respawn timer. All
//! mutation is serialized through its mailbox, so no two updates ever race
//! on a player's health.
//!
//! # Key types
//!
//! - [`ArenaHandle`]: send commands to the running actor
//! - [`Broadcaster`]: routes `(Recipient, ServerEvent)` pairs to sessions
//! - [`RoomConfig`]: tick rate and policy, scoreboard period, gameplay
//!   constants

mod arena;
mod broadcast;
mod config;
mod error;

pub use arena::{ArenaHandle, ArenaInfo, spawn_arena, spawn_arena_with};
pub use broadcast::{Broadcaster, SessionSender};
pub use config::RoomConfig;
pub use error::RoomError;

pub use arena_tick::{TickMetrics, TickPolicy};
