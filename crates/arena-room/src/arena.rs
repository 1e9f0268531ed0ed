//! The arena actor: one Tokio task that owns the [`World`].
//!
//! Every change to game state happens inside this task, one command or
//! timer at a time. Connection handlers talk to it through an
//! [`ArenaHandle`]; nothing else holds a reference to the world.
//!
//! Four sources wake the actor:
//!
//! - its command mailbox (connects, client events, queries)
//! - the fixed simulation tick
//! - the scoreboard cadence
//! - the earliest pending respawn

use std::ops::ControlFlow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arena_protocol::{ClientEvent, PlayerId};
use arena_sim::World;
use arena_tick::{Cadence, TickInfo, TickMetrics, TickScheduler};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::broadcast::{Broadcaster, SessionSender};
use crate::{RoomConfig, RoomError};

/// Commands sent to the arena actor.
pub(crate) enum ArenaCommand {
    /// Register a freshly accepted connection.
    Connect {
        player_id: PlayerId,
        sender: SessionSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// The connection is gone. Removes the session and its player.
    Disconnect { player_id: PlayerId },

    /// A decoded client event.
    Client {
        player_id: PlayerId,
        event: ClientEvent,
    },

    GetInfo { reply: oneshot::Sender<ArenaInfo> },

    Shutdown,
}

/// Arena metadata, for logs and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaInfo {
    /// Open connections, joined or not.
    pub sessions: usize,
    pub players: usize,
    pub projectiles: usize,
    pub ticks: u64,
    /// Overruns, skipped steps and tick execution times.
    pub tick_metrics: TickMetrics,
}

/// Handle to the running arena actor.
///
/// Cheap to clone; it wraps the mailbox sender.
#[derive(Debug, Clone)]
pub struct ArenaHandle {
    sender: mpsc::Sender<ArenaCommand>,
}

impl ArenaHandle {
    /// Registers a connection so it receives room-wide broadcasts.
    pub async fn connect(&self, player_id: PlayerId, sender: SessionSender) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ArenaCommand::Connect {
                player_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.sender
            .send(ArenaCommand::Disconnect { player_id })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Forwards a client event (fire-and-forget).
    pub async fn send(&self, player_id: PlayerId, event: ClientEvent) -> Result<(), RoomError> {
        self.sender
            .send(ArenaCommand::Client { player_id, event })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    pub async fn info(&self) -> Result<ArenaInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ArenaCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Stops the actor. Pending commands behind this one are dropped.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(ArenaCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

struct ArenaActor {
    world: World,
    sessions: Broadcaster,
    scheduler: TickScheduler,
    scoreboard: Cadence,
    /// Game time zero.
    started: Instant,
    receiver: mpsc::Receiver<ArenaCommand>,
}

impl ArenaActor {
    async fn run(mut self) {
        info!(
            tick_rate = self.scheduler.tick_rate_hz(),
            tick_policy = %self.scheduler.policy(),
            scoreboard_ms = self.scoreboard.period().as_millis() as u64,
            "arena started"
        );

        loop {
            let respawn_at = self.world.next_respawn_due().map(|due| self.started + due);

            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("all arena handles dropped");
                        break;
                    };
                    if self.handle_command(cmd).is_break() {
                        break;
                    }
                }
                tick = self.scheduler.wait_for_tick() => {
                    self.on_tick(tick);
                }
                _ = self.scoreboard.tick() => {
                    self.sessions.dispatch(vec![self.world.scoreboard()]);
                }
                _ = sleep_until(respawn_at) => {
                    let events = self.world.fire_due_respawns(self.now());
                    self.sessions.dispatch(events);
                }
            }
        }

        let stats = self.world.stats();
        info!(
            ticks = self.scheduler.tick_count(),
            overruns = self.scheduler.metrics().total_overruns,
            total_kills = stats.total_kills,
            total_deaths = stats.total_deaths,
            total_damage = stats.total_damage,
            "arena stopped"
        );
    }

    fn handle_command(&mut self, cmd: ArenaCommand) -> ControlFlow<()> {
        match cmd {
            ArenaCommand::Connect {
                player_id,
                sender,
                reply,
            } => {
                let result = self.sessions.register(player_id, sender);
                if result.is_ok() {
                    debug!(%player_id, sessions = self.sessions.len(), "session connected");
                }
                let _ = reply.send(result);
            }
            ArenaCommand::Disconnect { player_id } => {
                self.sessions.unregister(player_id);
                let events = self.world.leave(player_id);
                self.sessions.dispatch(events);
                debug!(%player_id, sessions = self.sessions.len(), "session disconnected");
            }
            ArenaCommand::Client { player_id, event } => {
                self.handle_client_event(player_id, event);
            }
            ArenaCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            ArenaCommand::Shutdown => {
                info!("arena shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_client_event(&mut self, player_id: PlayerId, event: ClientEvent) {
        let name = event.name();
        if !self.sessions.contains(player_id) {
            debug!(%player_id, event = name, "event from unknown session, ignoring");
            return;
        }

        let events = match event {
            ClientEvent::JoinGame(join) => self.world.join(player_id, join.name, join.character),
            ClientEvent::PlayerMove(input) => self.world.apply_movement(player_id, input),
            ClientEvent::PlayerShoot(input) => {
                let now = self.now();
                self.world.request_shoot(player_id, input, now)
            }
            ClientEvent::ChatMessage(chat) => {
                self.world.chat(player_id, &chat.message, unix_millis())
            }
            ClientEvent::Heartbeat(_) | ClientEvent::Disconnect => {
                debug!(%player_id, event = name, "connection event reached the arena, ignoring");
                return;
            }
        };
        self.sessions.dispatch(events);
    }

    fn on_tick(&mut self, tick: TickInfo) {
        let events = self.world.tick(self.now(), tick.sim_dt());
        self.sessions.dispatch(events);
        self.scheduler.record_tick_end();
    }

    /// Game time: how long the arena has been running.
    fn now(&self) -> Duration {
        self.started.elapsed()
    }

    fn info(&self) -> ArenaInfo {
        ArenaInfo {
            sessions: self.sessions.len(),
            players: self.world.player_count(),
            projectiles: self.world.projectile_count(),
            ticks: self.scheduler.tick_count(),
            tick_metrics: self.scheduler.metrics().clone(),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Wall-clock timestamp for chat lines.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Spawns the arena actor with a fresh world.
pub fn spawn_arena(config: RoomConfig) -> ArenaHandle {
    let world = World::new(config.game);
    spawn_arena_with(config, world)
}

/// Spawns the arena actor around an existing world, e.g. one built with
/// [`World::with_seed`].
pub fn spawn_arena_with(config: RoomConfig, world: World) -> ArenaHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));

    let actor = ArenaActor {
        world,
        sessions: Broadcaster::new(),
        scheduler: TickScheduler::new(config.tick_config()),
        scoreboard: Cadence::new(config.scoreboard_interval),
        started: Instant::now(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    ArenaHandle { sender: tx }
}
