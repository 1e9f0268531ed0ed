//! Scheduled respawns, keyed by player.

use std::collections::HashMap;
use std::time::Duration;

use arena_protocol::PlayerId;

/// Pending respawns.
///
/// At most one entry per player. Keyed by id so a disconnect cancels the
/// right one, and nothing fires for a player that has left.
#[derive(Debug, Default)]
pub struct RespawnQueue {
    due: HashMap<PlayerId, Duration>,
}

impl RespawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `player` to respawn at game time `at`, replacing any
    /// earlier entry.
    pub fn schedule(&mut self, player: PlayerId, at: Duration) {
        self.due.insert(player, at);
    }

    /// Drops the pending respawn for `player`. Returns whether one existed.
    pub fn cancel(&mut self, player: PlayerId) -> bool {
        self.due.remove(&player).is_some()
    }

    pub fn is_pending(&self, player: PlayerId) -> bool {
        self.due.contains_key(&player)
    }

    /// The earliest due time, if anything is scheduled.
    pub fn next_due(&self) -> Option<Duration> {
        self.due.values().min().copied()
    }

    /// Removes and returns every player due at or before `now`, earliest
    /// first. Ties are ordered by player id.
    pub fn take_due(&mut self, now: Duration) -> Vec<PlayerId> {
        let mut ready: Vec<(Duration, PlayerId)> = self
            .due
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (*at, *id))
            .collect();
        ready.sort_unstable();
        for (_, id) in &ready {
            self.due.remove(id);
        }
        ready.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}
