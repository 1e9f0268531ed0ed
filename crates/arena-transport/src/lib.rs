//! Transport layer for the rocket arena server.
//!
//! The arena speaks JSON text frames over a persistent bidirectional
//! channel per client. [`Transport`] accepts raw sockets, a [`Handshake`]
//! upgrades one into a channel, and [`Connection`] reads and writes it, so
//! the layers above never touch sockets directly.
//!
//! Accepting and upgrading are separate steps so that one slow client's
//! handshake never holds up the accept loop.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
///
/// Ids are never reused within a process, which is what lets the server
/// use them directly as player identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;
    /// An accepted socket whose handshake has not run yet.
    type Pending: Handshake<Connection = Self::Connection, Error = Self::Error>;

    /// Waits for the next client socket. Returns as soon as the socket is
    /// accepted, before any bytes are read from it.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;

    /// The address the listener is bound to.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// The upgrade step between an accepted socket and a [`Connection`].
///
/// Callers run it in the connection's own task, usually under a timeout.
pub trait Handshake: Send + 'static {
    /// The connection produced on success.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// The remote address of the socket.
    fn peer_addr(&self) -> SocketAddr;

    /// Runs the handshake. The connection id is assigned only on success.
    async fn complete(self) -> Result<Self::Connection, Self::Error>;
}

/// One client channel.
///
/// Reads and writes are independent: a task parked in [`recv`](Self::recv)
/// must never hold up an outgoing broadcast on the same connection.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one text frame.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the payload of the next data frame (text or binary).
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
