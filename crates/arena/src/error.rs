//! Unified error type for the arena server.

use arena_protocol::ProtocolError;
use arena_room::RoomError;
use arena_transport::TransportError;

/// Top-level error wrapping every layer's error.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
/// None of these reach clients: a failing connection is logged and closed.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// Connection, send, or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The arena actor is gone or rejected the session.
    #[error(transparent)]
    Room(#[from] RoomError),
}
