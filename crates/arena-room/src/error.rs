//! Error types for the arena actor.

use arena_protocol::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The actor's mailbox is closed: it shut down or panicked.
    #[error("arena is unavailable")]
    Unavailable,

    /// A session with this id is already registered.
    #[error("session {0} is already connected")]
    AlreadyConnected(PlayerId),
}
