//! Fixed-timestep tick scheduler with overrun handling and budget metrics.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickPolicy {
    /// Schedule the next tick one step from now. All lateness, whole steps
    /// and fractions alike, is folded into [`TickInfo::sim_dt`].
    #[default]
    Skip,
    /// Keep the original schedule. Late ticks fire back to back until the
    /// loop is caught up, each covering exactly one step.
    Drop,
}

impl fmt::Display for TickPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::Drop => f.write_str("drop"),
        }
    }
}

impl FromStr for TickPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown tick policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz, `1..=128`.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick budget (0.0 to 1.0) above which a warning is
    /// logged. A tick that uses the whole budget is always reported.
    pub budget_warn_threshold: f64,
    /// Track average and maximum tick execution time.
    pub metrics_enabled: bool,
    /// Random delay (0–max µs) added to the first tick only.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Self::DEFAULT_TICK_RATE_HZ,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            metrics_enabled: true,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    pub const DEFAULT_TICK_RATE_HZ: u32 = 60;
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    ///
    /// - `tick_rate_hz` is clamped to `1..=MAX_TICK_RATE_HZ`.
    /// - `budget_warn_threshold` is clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz == 0 || self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        if self.budget_warn_threshold.is_nan() {
            self.budget_warn_threshold = 1.0;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one tick. Assumes a validated, non-zero rate.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// One fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Starts at 1 and increases by one per fired tick.
    pub tick: u64,
    /// The fixed step, `1 / tick_rate`.
    pub dt: Duration,
    /// Woke up more than 10% of a step late.
    pub overrun: bool,
    /// Whole steps dropped under [`TickPolicy::Skip`].
    pub ticks_skipped: u64,
    /// How far past its deadline the tick woke up.
    pub late_by: Duration,
    span: Duration,
}

impl TickInfo {
    /// Simulated time this tick covers.
    ///
    /// Under [`TickPolicy::Skip`] that is the step plus however late the
    /// tick fired, so simulated time keeps pace with the clock even when
    /// every wakeup lands a little after its deadline. Under
    /// [`TickPolicy::Drop`] the schedule itself recovers the lateness and
    /// each tick covers exactly one step.
    pub fn sim_dt(&self) -> Duration {
        self.span
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Tick timing counters, reported through the arena's info query.
///
/// Timing values measure game logic only: the span between
/// `wait_for_tick` returning and [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average, α = 0.1.
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
    /// Last tick's execution time over the budget. Above 1.0 is a breach.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep tick scheduler. One per arena.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    /// Wall-clock start of the current tick's logic.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler whose first tick fires one step from now, plus
    /// optional jitter.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        let next_tick = TokioInstant::now() + tick_duration + jitter;

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Sleeps until the next tick is due.
    ///
    /// Cancel-safe: if the future is dropped inside `select!`, the
    /// deadline is unchanged and the next call waits for the same tick.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let deadline = self.next_tick;
        let step = self.tick_duration;

        time::sleep_until(deadline).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > step / 10;
        let mut ticks_skipped = 0u64;
        let mut span = step;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = whole_steps(late_by, step);
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                span = step + late_by;
                now + step
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, keeping schedule"
                    );
                }
                deadline + step
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: step,
            overrun,
            ticks_skipped,
            late_by,
            span,
        }
    }

    /// Marks the end of the current tick's game logic.
    ///
    /// Feeds budget warnings and metrics. A no-op without a preceding
    /// `wait_for_tick`.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let budget = self.tick_duration;
        let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
        self.metrics.budget_utilization = utilization;

        if utilization >= 1.0 {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "tick exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "tick approaching budget"
            );
        }

        if self.config.metrics_enabled {
            if elapsed > self.metrics.max_tick_time {
                self.metrics.max_tick_time = elapsed;
            }
            let alpha = 0.1;
            let prev = self.metrics.avg_tick_time.as_secs_f64();
            self.metrics.avg_tick_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + elapsed.as_secs_f64() * alpha);
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn policy(&self) -> TickPolicy {
        self.config.policy
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}

fn whole_steps(late_by: Duration, step: Duration) -> u64 {
    let step = step.as_nanos().max(1);
    u64::try_from(late_by.as_nanos() / step).unwrap_or(u64::MAX)
}
