//! The `Task` trait — one polled unit of work inside a schedule.

use npc_core::ScheduleId;

use crate::{ConditionContext, Env};

/// A unit of work polled by its [`Schedule`][crate::Schedule] once per
/// evaluation cycle until it reports finished.
///
/// Tasks are persistent: the same instance is polled every cycle, so
/// progress lives in `self`.  `execute` must never block; a task waiting on
/// something asynchronous (an animation callback, a move) records that it
/// started and returns `false` until the outcome arrives.
///
/// # Example
///
/// ```rust,ignore
/// struct Wait { until: Option<Tick>, ticks: u64 }
///
/// impl Task for Wait {
///     fn execute(&mut self, _ctx: &mut ConditionContext, env: &mut Env<'_>) -> bool {
///         let until = *self.until.get_or_insert(env.now + self.ticks);
///         env.now >= until
///     }
/// }
/// ```
pub trait Task {
    /// Advance the task.  `true` means finished for good.
    fn execute(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) -> bool;

    /// Record the schedule that owns this task.
    fn bind(&mut self, _schedule: ScheduleId) {}

    /// Short name for logs.
    fn label(&self) -> &str {
        "task"
    }
}
