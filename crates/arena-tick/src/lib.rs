//! Timing for the arena loop.
//!
//! Two clocks drive the arena actor:
//!
//! - [`TickScheduler`]: the fixed-timestep simulation tick (60 Hz by
//!   default) with overrun handling and budget monitoring.
//! - [`Cadence`]: a plain periodic schedule that is independent of the tick
//!   count. The scoreboard uses one, so a slow tick never changes how often
//!   standings go out.
//!
//! Both are meant to sit inside the actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = scheduler.wait_for_tick() => {
//!             let events = world.tick(started.elapsed(), tick.sim_dt());
//!             scheduler.record_tick_end();
//!         }
//!         _ = scoreboard.tick() => { /* broadcast standings */ }
//!     }
//! }
//! ```

mod cadence;
mod scheduler;

pub use cadence::Cadence;
pub use scheduler::{TickConfig, TickInfo, TickMetrics, TickPolicy, TickScheduler};
