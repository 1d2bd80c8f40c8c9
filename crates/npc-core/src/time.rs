//! Runtime time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  The mapping to wall
//! time is held in `Clock`:
//!
//!   elapsed_ms = tick * tick_duration_ms
//!
//! Every timer, delay and clip length in the framework is expressed in whole
//! ticks, so timer ordering is exact and replays are deterministic.  The
//! default tick is 100 ms; a 0.2 s think interval is therefore 2 ticks.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute runtime tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Converts between tick counts and elapsed milliseconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clock {
    /// How many milliseconds one tick represents.  Default: 100.
    pub tick_duration_ms: u32,
    /// The current tick, advanced by `Clock::advance()` each iteration.
    pub current_tick: Tick,
}

impl Clock {
    pub fn new(tick_duration_ms: u32) -> Self {
        Self {
            tick_duration_ms,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed milliseconds since tick 0.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.current_tick.0 * self.tick_duration_ms as u64
    }

    // ── Tick-count helpers ────────────────────────────────────────────────

    /// How many ticks span `ms` milliseconds?  Rounds up, so a timer never
    /// fires early.
    #[inline]
    pub fn ticks_for_millis(&self, ms: u64) -> u64 {
        ms.div_ceil(self.tick_duration_ms.max(1) as u64)
    }

    #[inline]
    pub fn ticks_for_secs_f32(&self, secs: f32) -> u64 {
        self.ticks_for_millis((secs.max(0.0) * 1_000.0).round() as u64)
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.elapsed_ms();
        write!(f, "{} ({}.{:03}s)", self.current_tick, ms / 1_000, ms % 1_000)
    }
}

// ── RuntimeConfig ─────────────────────────────────────────────────────────────

/// Top-level runtime configuration.
///
/// Typically loaded from a JSON/TOML file by the application crate and passed
/// to the runtime builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeConfig {
    /// Milliseconds per tick.  Default: 100.
    pub tick_duration_ms: u32,

    /// Total ticks to run.  `Runtime::run` stops at this bound.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Ticks between two evaluation cycles of a behavior driver.
    pub think_interval_ticks: u64,

    /// Delay before a driver's first evaluation when `run` is given none.
    pub start_delay_ticks: u64,

    /// Call `RuntimeObserver::on_snapshot` every N ticks (0 = never).
    pub snapshot_interval_ticks: u64,
}

impl RuntimeConfig {
    /// The tick at which the run ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `Clock` pre-configured for this run.
    pub fn make_clock(&self) -> Clock {
        Clock::new(self.tick_duration_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms:        100,
            total_ticks:             600,
            seed:                    0,
            think_interval_ticks:    2,
            start_delay_ticks:       1,
            snapshot_interval_ticks: 0,
        }
    }
}
