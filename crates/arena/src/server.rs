//! `ArenaServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → arena actor.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arena_protocol::{Codec, JsonCodec};
use arena_room::{ArenaHandle, RoomConfig, spawn_arena, spawn_arena_with};
use arena_sim::World;
use arena_transport::{Handshake, Transport, WebSocketTransport};
use tokio::time;
use tracing::{debug, error, info};

use crate::handler::handle_connection;
use crate::{ArenaError, ServerConfig};

/// Shared state handed to every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) arena: ArenaHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) handshake_timeout: Duration,
    pub(crate) write_timeout: Duration,
    pub(crate) session_queue_capacity: usize,
}

/// Builder for configuring and starting an arena server.
///
/// # Example
///
/// ```rust,no_run
/// use arena::prelude::*;
///
/// # async fn start() -> Result<(), ArenaError> {
/// let server = ArenaServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ArenaServerBuilder {
    config: ServerConfig,
    world: Option<World>,
}

impl ArenaServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            world: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Starts the arena around a prepared world instead of a fresh one.
    /// Its gameplay config takes precedence over the room config's.
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Binds the listener and spawns the arena actor.
    pub async fn build(self) -> Result<ArenaServer, ArenaError> {
        let transport = WebSocketTransport::bind(&self.config.bind).await?;

        let session_queue_capacity = self.config.room.session_queue_capacity.max(1);
        let arena = match self.world {
            Some(world) => spawn_arena_with(self.config.room, world),
            None => spawn_arena(self.config.room),
        };

        let state = Arc::new(ServerState {
            arena,
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
            handshake_timeout: self.config.handshake_timeout,
            write_timeout: self.config.write_timeout,
            session_queue_capacity,
        });

        Ok(ArenaServer { transport, state })
    }
}

impl Default for ArenaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound arena server. Call [`run`](Self::run) to accept clients.
pub struct ArenaServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
}

impl ArenaServer {
    pub fn builder() -> ArenaServerBuilder {
        ArenaServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the arena actor, e.g. for [`ArenaHandle::info`].
    pub fn arena(&self) -> &ArenaHandle {
        &self.state.arena
    }

    /// Accepts connections until the process exits.
    pub async fn run(self) -> Result<(), ArenaError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes, then stops the
    /// arena actor.
    ///
    /// Each accepted socket gets its own task, which runs the WebSocket
    /// handshake under the configured timeout and then the handler. A
    /// failed accept is logged and does not stop the loop.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), ArenaError> {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, "arena server running");
        }
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            let peer = pending.peer_addr();
                            let handshake =
                                time::timeout(state.handshake_timeout, pending.complete());
                            let conn = match handshake.await {
                                Ok(Ok(conn)) => conn,
                                Ok(Err(e)) => {
                                    debug!(%peer, error = %e, "handshake failed");
                                    return;
                                }
                                Err(_) => {
                                    debug!(%peer, "handshake timed out");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, state).await {
                                debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        self.state.arena.shutdown().await?;
        Ok(())
    }
}
