//! No-op policy and task.

use crate::{BehaviorPolicy, ConditionContext, Env, Schedule, Task};

/// A [`BehaviorPolicy`] that never selects a schedule.
///
/// Useful as a placeholder for passive actors and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPolicy;

impl BehaviorPolicy for NoopPolicy {
    fn select_new_schedule(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) -> Option<Schedule> {
        None
    }
}

/// A [`Task`] that finishes on its first poll.
#[derive(Debug, Default)]
pub struct NoopTask;

impl Task for NoopTask {
    fn execute(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) -> bool {
        true
    }

    fn label(&self) -> &str {
        "noop"
    }
}
