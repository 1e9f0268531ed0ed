//! Per-connection handler: boundary validation and event pumping.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]:
//!
//!   1. Register an outbound channel with the arena actor.
//!   2. Loop over three sources until the client leaves:
//!      - inbound frames: decode, validate, forward to the arena
//!      - outbound events from the arena: encode, send under the write
//!        timeout
//!      - the idle deadline, if configured
//!   3. On exit, the guard tells the arena the session is gone.
//!
//! The outbound channel is bounded. When it fills, the arena drops the
//! session and the closed channel ends this loop.
//!
//! Heartbeats are answered here and never reach the arena.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arena_protocol::{ClientEvent, Codec, HeartbeatAck, JoinRequest, PlayerId, ServerEvent};
use arena_room::ArenaHandle;
use arena_sim::rules::{sanitize_character, sanitize_name};
use arena_transport::{Connection, TransportError, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::ArenaError;
use crate::server::ServerState;

/// Drop guard that removes the session from the arena when the handler
/// exits, panics included. `Drop` is synchronous, so the disconnect is sent
/// from a spawned task.
struct SessionGuard {
    player_id: PlayerId,
    arena: ArenaHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let arena = self.arena.clone();
        tokio::spawn(async move {
            let _ = arena.disconnect(player_id).await;
        });
    }
}

/// Per-connection state the frame handler needs.
struct Session<'a, C: Codec> {
    player_id: PlayerId,
    conn: &'a WebSocketConnection,
    state: &'a ServerState<C>,
    joined: bool,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ArenaError> {
    // Connection ids are never reused, so they double as player ids.
    let player_id = PlayerId(conn.id().into_inner());
    let (tx, mut outbound) = mpsc::channel(state.session_queue_capacity);

    state.arena.connect(player_id, tx).await?;
    let _guard = SessionGuard {
        player_id,
        arena: state.arena.clone(),
    };
    info!(%player_id, peer = %conn.peer_addr(), "client connected");

    let mut session = Session {
        player_id,
        conn: &conn,
        state: &state,
        joined: false,
    };
    let mut last_inbound = Instant::now();

    let result = loop {
        let idle_deadline = state.idle_timeout.map(|t| last_inbound + t);

        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        info!(%player_id, "client disconnected");
                        break Ok(());
                    }
                    Err(e) => {
                        debug!(%player_id, error = %e, "recv error");
                        break Ok(());
                    }
                };
                last_inbound = Instant::now();
                match session.handle_frame(&data).await {
                    Ok(ControlFlow::Continue(())) => {}
                    Ok(ControlFlow::Break(())) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
            event = outbound.recv() => {
                let Some(event) = event else {
                    info!(%player_id, "arena closed the session");
                    break Ok(());
                };
                if let Err(e) = session.send(&event).await {
                    break Err(e);
                }
            }
            () = sleep_until(idle_deadline) => {
                info!(%player_id, "connection idle, closing");
                break Ok(());
            }
        }
    };

    let _ = conn.close().await;
    // _guard drops here → the arena removes the session.
    result
}

impl<C: Codec> Session<'_, C> {
    /// Decodes and routes one inbound frame. Breaks when the client asks
    /// to leave.
    async fn handle_frame(&mut self, data: &[u8]) -> Result<ControlFlow<()>, ArenaError> {
        let player_id = self.player_id;
        let event: ClientEvent = match self.state.codec.decode(data) {
            Ok(event) => event,
            Err(e) => {
                debug!(%player_id, error = %e, "dropping undecodable frame");
                return Ok(ControlFlow::Continue(()));
            }
        };

        match event {
            ClientEvent::Heartbeat(beat) => {
                let ack = ServerEvent::HeartbeatAck(HeartbeatAck {
                    client_time: beat.client_time,
                    server_time: unix_millis(),
                });
                self.send(&ack).await?;
            }
            ClientEvent::Disconnect => {
                info!(%player_id, "client requested disconnect");
                return Ok(ControlFlow::Break(()));
            }
            ClientEvent::JoinGame(request) => {
                if self.joined {
                    debug!(%player_id, "join ignored, already joined");
                    return Ok(ControlFlow::Continue(()));
                }
                let Some(name) = sanitize_name(&request.name) else {
                    debug!(%player_id, "join ignored, empty name");
                    return Ok(ControlFlow::Continue(()));
                };
                let character = sanitize_character(&request.character);
                self.joined = true;
                self.state
                    .arena
                    .send(player_id, ClientEvent::JoinGame(JoinRequest { name, character }))
                    .await?;
            }
            event if !self.joined => {
                debug!(%player_id, event = event.name(), "dropping event before join");
            }
            event => {
                self.state.arena.send(player_id, event).await?;
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn send(&self, event: &ServerEvent) -> Result<(), ArenaError> {
        let text = self.state.codec.encode(event)?;
        match time::timeout(self.state.write_timeout, self.conn.send(&text)).await {
            Ok(sent) => sent?,
            Err(_) => {
                return Err(TransportError::ConnectionClosed(format!(
                    "write stalled for {:?}",
                    self.state.write_timeout
                ))
                .into());
            }
        }
        Ok(())
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
