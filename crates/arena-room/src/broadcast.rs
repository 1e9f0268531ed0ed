//! Fan-out of simulation events to connected sessions.

use std::collections::BTreeMap;

use arena_protocol::{PlayerId, Recipient, ServerEvent};
use arena_sim::Outbound;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::RoomError;

/// Channel that delivers events to one connection handler. Bounded, see
/// [`RoomConfig::session_queue_capacity`](crate::RoomConfig).
pub type SessionSender = mpsc::Sender<ServerEvent>;

/// Every open session, joined or not.
///
/// A connection is registered as soon as it is accepted, so room-wide
/// broadcasts reach clients still sitting in the lobby. Sends never block:
///
/// - a session whose handler is gone is skipped and removed when its
///   disconnect arrives
/// - a session whose queue is full has stopped keeping up; it is dropped
///   on the spot, which closes its channel and ends the connection
#[derive(Debug, Default)]
pub struct Broadcaster {
    sessions: BTreeMap<PlayerId, SessionSender>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: PlayerId, sender: SessionSender) -> Result<(), RoomError> {
        if self.sessions.contains_key(&id) {
            return Err(RoomError::AlreadyConnected(id));
        }
        self.sessions.insert(id, sender);
        Ok(())
    }

    /// Returns whether the session was registered.
    pub fn unregister(&mut self, id: PlayerId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Delivers events in order to their recipients, then drops every
    /// session that ran out of queue space.
    pub fn dispatch(&mut self, events: Vec<Outbound>) {
        let mut lagging = Vec::new();
        for (recipient, event) in events {
            match recipient {
                Recipient::Player(id) => {
                    if let Some(sender) = self.sessions.get(&id) {
                        deliver(id, sender, event, &mut lagging);
                    }
                }
                Recipient::All | Recipient::AllExcept(_) => {
                    for (id, sender) in &self.sessions {
                        if recipient.includes(*id) {
                            deliver(*id, sender, event.clone(), &mut lagging);
                        }
                    }
                }
            }
        }

        for id in lagging {
            if self.sessions.remove(&id).is_some() {
                warn!(player_id = %id, "session queue full, dropping session");
            }
        }
    }
}

fn deliver(id: PlayerId, sender: &SessionSender, event: ServerEvent, lagging: &mut Vec<PlayerId>) {
    match sender.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(_)) => lagging.push(id),
    }
}
