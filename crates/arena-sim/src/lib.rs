//! Authoritative simulation for the rocket arena.
//!
//! Everything here is synchronous and deterministic given a seed:
//!
//! - [`World`]: players, projectiles, respawns, and the fixed tick.
//! - [`collision`]: bounds, direct hits, splash falloff, rocket jumps.
//! - [`rules`]: server-side constants and input sanitizing.
//!
//! The arena actor in `arena-room` owns a `World` and feeds it client
//! requests and ticks; the events it returns go straight to the
//! broadcaster.

pub mod collision;
mod player;
mod projectile;
mod respawn;
pub mod rules;
mod scoreboard;
mod world;

pub use player::Player;
pub use projectile::{Fate, Projectile};
pub use respawn::RespawnQueue;
pub use scoreboard::standings;
pub use world::{GameStats, Outbound, World};
