//! Arena configuration.

use std::time::Duration;

use arena_protocol::GameConfig;
use arena_tick::{TickConfig, TickPolicy};
use serde::{Deserialize, Serialize};

/// Settings for one arena actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Simulation tick rate in Hz, `1..=128`.
    pub tick_rate: u32,

    /// How a late tick is handled.
    pub tick_policy: TickPolicy,

    /// Fraction of the tick budget above which slow ticks are logged.
    pub tick_budget_warn: f64,

    /// How often standings are broadcast, independent of the tick rate.
    pub scoreboard_interval: Duration,

    /// Capacity of the actor's command mailbox. Senders wait when full.
    pub mailbox_capacity: usize,

    /// Events queued per session before it counts as lagging and is
    /// dropped.
    pub session_queue_capacity: usize,

    /// Gameplay constants, also sent to every client on join.
    pub game: GameConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tick_rate: TickConfig::DEFAULT_TICK_RATE_HZ,
            tick_policy: TickPolicy::default(),
            tick_budget_warn: 0.8,
            scoreboard_interval: Duration::from_secs(1),
            mailbox_capacity: 1_024,
            session_queue_capacity: 1_024,
            game: GameConfig::default(),
        }
    }
}

impl RoomConfig {
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            policy: self.tick_policy,
            budget_warn_threshold: self.tick_budget_warn,
            ..TickConfig::with_rate(self.tick_rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_room_config() {
        let cfg = RoomConfig::default();
        assert_eq!(cfg.tick_rate, 60);
        assert_eq!(cfg.scoreboard_interval, Duration::from_secs(1));
        assert_eq!(cfg.game, GameConfig::default());
        assert_eq!(cfg.tick_config().tick_rate_hz, 60);
        assert_eq!(cfg.tick_config().policy, TickPolicy::Skip);
        assert_eq!(cfg.session_queue_capacity, 1_024);
    }

    #[test]
    fn test_tick_settings_reach_tick_config() {
        let cfg = RoomConfig {
            tick_rate: 30,
            tick_policy: TickPolicy::Drop,
            tick_budget_warn: 0.5,
            ..RoomConfig::default()
        };
        let tick = cfg.tick_config();
        assert_eq!(tick.tick_rate_hz, 30);
        assert_eq!(tick.policy, TickPolicy::Drop);
        assert_eq!(tick.budget_warn_threshold, 0.5);
    }
}
