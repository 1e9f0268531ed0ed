//! Periodic schedule for work that runs independently of the tick count.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Shortest period a [`Cadence`] accepts.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A periodic schedule that fires every `period`, starting one period
/// after creation.
///
/// Missed firings are skipped rather than bunched up, so a stalled actor
/// sends one update when it recovers, not a burst.
#[derive(Debug)]
pub struct Cadence {
    interval: Interval,
    period: Duration,
    fired: u64,
}

impl Cadence {
    pub fn new(period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            period,
            fired: 0,
        }
    }

    /// Waits for the next firing and returns how many times the cadence
    /// has fired, this one included.
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.fired += 1;
        self.fired
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}
