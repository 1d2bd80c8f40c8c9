//! The `BehaviorPolicy` trait — the per-species extension point.

use crate::{ConditionContext, Env, Schedule, SignalBus, Subscription};

/// Decides what an actor does.
///
/// The [`BehaviorDriver`][crate::BehaviorDriver] calls the hooks in a fixed
/// order every evaluation cycle:
///
/// ```text
/// gather_conditions → (select_new_schedule if none or completed)
///                   → pre_think → schedule.execute → post_think
/// ```
///
/// Only [`select_new_schedule`](Self::select_new_schedule) is required.
///
/// # Example
///
/// ```rust,ignore
/// struct Idler;
///
/// impl BehaviorPolicy for Idler {
///     fn select_new_schedule(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) -> Option<Schedule> {
///         Some(Schedule::new("idle")
///             .then(PlayAnimationTask::new("idle").with_repeat(Repeat::Forever))
///             .interrupted_by(["poked"]))
///     }
/// }
/// ```
pub trait BehaviorPolicy {
    /// Pick the next schedule.  `None` leaves the actor idle until the next
    /// cycle.
    fn select_new_schedule(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) -> Option<Schedule>;

    /// Add this cycle's conditions to `ctx`.
    fn gather_conditions(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) {}

    fn pre_think(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) {}

    fn post_think(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) {}

    /// Subscriptions the driver should hold on the policy's behalf.  Signals
    /// they receive are folded into the next cycle's conditions.
    fn subscribe(&mut self, _bus: &SignalBus) -> Vec<Subscription> {
        Vec::new()
    }

    /// Release anything the policy registered outside the driver.
    fn clean_up(&mut self) {}
}

impl<P: BehaviorPolicy + ?Sized> BehaviorPolicy for Box<P> {
    fn select_new_schedule(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) -> Option<Schedule> {
        (**self).select_new_schedule(ctx, env)
    }

    fn gather_conditions(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) {
        (**self).gather_conditions(ctx, env)
    }

    fn pre_think(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) {
        (**self).pre_think(ctx, env)
    }

    fn post_think(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) {
        (**self).post_think(ctx, env)
    }

    fn subscribe(&mut self, bus: &SignalBus) -> Vec<Subscription> {
        (**self).subscribe(bus)
    }

    fn clean_up(&mut self) {
        (**self).clean_up()
    }
}
