//! Wire protocol for the rocket arena.
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`] and their payloads): what
//!   travels on the wire, one JSON object per frame.
//! - **Identity and routing** ([`PlayerId`], [`ProjectileId`],
//!   [`Recipient`]).
//! - **Configuration** ([`GameConfig`]): the constants every client receives
//!   on join.
//! - **Codec** ([`Codec`], [`JsonCodec`]): events to text frames and back.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Room (arena actor) → Sim (world)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    ChatInput, ChatLine, ClientEvent, GameJoined, Heartbeat, HeartbeatAck, JoinRequest, MoveInput,
    PlayerHit, PlayerKilled, PlayerMoved, PlayerSnapshot, ProjectileExploded, ProjectileFired,
    RocketJump, ScoreEntry, ServerEvent, ShootInput,
};
pub use types::{GameConfig, PlayerId, ProjectileId, Recipient, xyz};

/// Re-exported so downstream crates name the same vector type.
pub use glam::DVec3;
