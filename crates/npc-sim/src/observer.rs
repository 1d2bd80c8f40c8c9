//! Runtime observer trait for progress reporting and state capture.

use npc_core::{ActorId, Cell, Tick};

/// Read-only view of one actor, handed to [`RuntimeObserver::on_snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    pub actor:     ActorId,
    /// Label of the schedule the driver is running, if any.
    pub schedule:  Option<String>,
    /// Clip playing on the actor's model, if any.
    pub clip:      Option<String>,
    pub position:  Option<Cell>,
    pub moving:    bool,
    pub run_count: u64,
}

/// Callbacks invoked by [`Runtime::run`][crate::Runtime::run] at key points in
/// the tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl RuntimeObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, tick: Tick, cycles: usize) {
///         if tick.0 % self.interval == 0 {
///             println!("tick {tick}: {cycles} evaluation cycles");
///         }
///     }
/// }
/// ```
pub trait RuntimeObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick.  `cycles` is the number of driver
    /// evaluation cycles that ran this tick.
    fn on_tick_end(&mut self, _tick: Tick, _cycles: usize) {}

    /// Called every `config.snapshot_interval_ticks` ticks.
    fn on_snapshot(&mut self, _tick: Tick, _actors: &[ActorSnapshot]) {}

    /// Called once after the final tick of [`Runtime::run`][crate::Runtime::run].
    fn on_run_end(&mut self, _final_tick: Tick) {}
}

/// A [`RuntimeObserver`] that does nothing.
pub struct NoopObserver;

impl RuntimeObserver for NoopObserver {}
