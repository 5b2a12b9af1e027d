#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep accumulator that turns real frame time into simulation ticks.
//!
//! Every frame adds its elapsed time to the carried remainder; each whole
//! tick contained in the total runs one simulation step. Ticks beyond the
//! per-frame ceiling are discarded so a stalled frame can never trigger a
//! runaway catch-up loop. The sub-tick remainder is always carried.

use std::time::Duration;

use tracing::warn;

/// Default ceiling on ticks processed for a single frame.
pub const DEFAULT_MAX_TICKS_PER_FRAME: u32 = 6;

/// Number of ticks a frame should run, plus any ticks the ceiling discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FramePlan {
    /// Simulation steps to execute this frame.
    pub ticks: u32,
    /// Whole ticks of backlog discarded by the ceiling.
    pub dropped: u64,
}

/// Accumulator-based fixed-timestep clock.
#[derive(Clone, Debug)]
pub struct SimulationClock {
    tick: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl SimulationClock {
    /// Creates a clock with the given tick duration and per-frame ceiling.
    ///
    /// A zero tick is raised to one nanosecond and a zero ceiling to one tick.
    #[must_use]
    pub fn new(tick: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            tick: tick.max(Duration::from_nanos(1)),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        }
    }

    /// Creates a clock ticking `ticks_per_second` times per simulated second.
    #[must_use]
    pub fn from_rate(ticks_per_second: u32, max_ticks_per_frame: u32) -> Self {
        let tick = Duration::from_secs(1) / ticks_per_second.max(1);
        Self::new(tick, max_ticks_per_frame)
    }

    /// Duration of a single simulation tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Ceiling on ticks processed for a single frame.
    #[must_use]
    pub const fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Sub-tick time carried into the next frame.
    #[must_use]
    pub const fn remainder(&self) -> Duration {
        self.accumulator
    }

    /// Discards any carried time.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Adds `frame_dt` to the carried time and plans the ticks to run.
    pub fn advance(&mut self, frame_dt: Duration) -> FramePlan {
        self.accumulator = self.accumulator.saturating_add(frame_dt);

        let mut ticks = 0_u32;
        while self.accumulator >= self.tick && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.tick;
            ticks += 1;
        }

        if self.accumulator < self.tick {
            return FramePlan { ticks, dropped: 0 };
        }

        let backlog = self.accumulator.as_nanos();
        let tick = self.tick.as_nanos();
        let dropped = u64::try_from(backlog / tick).unwrap_or(u64::MAX);
        let remainder = u64::try_from(backlog % tick).unwrap_or(0);
        self.accumulator = Duration::from_nanos(remainder);
        warn!(
            ticks,
            dropped_ticks = dropped,
            dropped_backlog_ms = (backlog - u128::from(remainder)) / 1_000_000,
            "sim_clamp_triggered"
        );

        FramePlan { ticks, dropped }
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::from_rate(60, DEFAULT_MAX_TICKS_PER_FRAME)
    }
}
