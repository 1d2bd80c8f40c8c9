//! `BehaviorDriver` — one actor's periodic evaluation loop.
//!
//! # Lifecycle
//!
//! ```text
//! new ──run()──► start timer ──elapsed──► interval timer ──elapsed──► execute
//!  ▲                                            ▲                        │
//!  │                                            └────── re-arm ──────────┘
//!  └──────────── reset() / clean_up() cancels both timers
//! ```
//!
//! The driver never owns the clock or the timer queue; the runtime passes
//! them in and routes fired timers back through [`BehaviorDriver::on_timer`].

use npc_core::{ActorId, Tick, TimerId};
use tracing::{debug, trace};

use crate::{
    BehaviorPolicy, Blackboard, ConditionContext, Env, Schedule, SignalBus, Subscription,
    TimerEntry, TimerKind, TimerQueue,
};

pub struct BehaviorDriver<P: BehaviorPolicy> {
    actor:          ActorId,
    policy:         P,
    schedule:       Option<Schedule>,
    context:        ConditionContext,
    active:         bool,
    start_delay:    u64,
    interval:       u64,
    run_count:      u64,
    start_timer:    Option<TimerId>,
    interval_timer: Option<TimerId>,
    subscriptions:  Vec<Subscription>,
}

impl<P: BehaviorPolicy> BehaviorDriver<P> {
    /// An inactive driver for `actor`.
    pub fn new(actor: ActorId, policy: P) -> Self {
        Self {
            actor,
            policy,
            schedule:       None,
            context:        ConditionContext::new(actor),
            active:         false,
            start_delay:    0,
            interval:       1,
            run_count:      0,
            start_timer:    None,
            interval_timer: None,
            subscriptions:  Vec::new(),
        }
    }

    /// Let the policy subscribe to `bus`.  The driver owns the returned
    /// subscriptions until [`clean_up`](Self::clean_up).
    pub fn attach_signals(&mut self, bus: &SignalBus) {
        let subs = self.policy.subscribe(bus);
        self.subscriptions.extend(subs);
    }

    // ── Timers ────────────────────────────────────────────────────────────

    /// Activate the driver.
    ///
    /// A positive `start_delay` replaces the stored delay; zero reuses the
    /// stored one (1 tick if none was ever set).  Pending timers are
    /// cancelled before the start timer is armed, so calling `run` twice
    /// leaves exactly one evaluation loop.
    pub fn run(&mut self, timers: &mut TimerQueue, now: Tick, interval: u64, start_delay: u64) {
        self.active = true;
        if start_delay > 0 {
            self.start_delay = start_delay;
        } else if self.start_delay == 0 {
            self.start_delay = 1;
        }
        self.interval = interval.max(1);

        self.cancel_timers(timers);
        self.start_timer = Some(timers.schedule(now + self.start_delay, self.actor, TimerKind::Start));
        debug!(actor = %self.actor, delay = self.start_delay, interval = self.interval, "driver started");
    }

    /// The start delay elapsed: arm the recurring evaluation timer.
    pub fn on_start_elapsed(&mut self, timers: &mut TimerQueue, now: Tick) {
        self.start_timer = None;
        if let Some(old) = self.interval_timer.take() {
            timers.cancel(old);
        }
        self.interval_timer = Some(timers.schedule(now + self.interval, self.actor, TimerKind::Interval));
    }

    /// Route a fired timer.  Timers this driver no longer owns are ignored.
    /// Returns `true` if an evaluation cycle ran.
    pub fn on_timer(&mut self, timers: &mut TimerQueue, fired: TimerEntry, env: &mut Env<'_>) -> bool {
        match fired.kind {
            TimerKind::Start if self.start_timer == Some(fired.id) => {
                self.on_start_elapsed(timers, env.now);
                false
            }
            TimerKind::Interval if self.interval_timer == Some(fired.id) => {
                self.interval_timer = None;
                self.execute(env);
                if self.active && self.interval_timer.is_none() {
                    self.interval_timer =
                        Some(timers.schedule(env.now + self.interval, self.actor, TimerKind::Interval));
                }
                true
            }
            _ => {
                trace!(actor = %self.actor, timer = %fired.id, "stale timer ignored");
                false
            }
        }
    }

    fn cancel_timers(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.start_timer.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.interval_timer.take() {
            timers.cancel(id);
        }
    }

    // ── Evaluation cycle ──────────────────────────────────────────────────

    /// Run one evaluation cycle.
    pub fn execute(&mut self, env: &mut Env<'_>) {
        for sub in &self.subscriptions {
            for signal in sub.drain() {
                self.context.raise_signal(signal);
            }
        }
        self.context = self.context.next_cycle();
        let ctx = &mut self.context;

        self.policy.gather_conditions(ctx, env);

        let replace = match &self.schedule {
            None => true,
            Some(current) => {
                if let Some(cause) = current.interrupt_cause(ctx) {
                    debug!(actor = %self.actor, schedule = current.label(), cause, "schedule interrupted");
                    true
                } else {
                    current.is_finished()
                }
            }
        };
        if replace {
            self.schedule = self.policy.select_new_schedule(ctx, env);
            match &self.schedule {
                Some(s) => debug!(actor = %self.actor, schedule = s.label(), id = %s.id(), tasks = s.len(), "schedule selected"),
                None => trace!(actor = %self.actor, "no schedule selected"),
            }
        }

        self.policy.pre_think(ctx, env);
        if let Some(schedule) = self.schedule.as_mut() {
            schedule.execute(ctx, env);
        }
        self.policy.post_think(ctx, env);
        self.run_count += 1;
    }

    /// Cancel both timers and drop the schedule.  The driver becomes
    /// inactive but keeps its subscriptions.
    pub fn reset(&mut self, timers: &mut TimerQueue) {
        self.schedule = None;
        self.cancel_timers(timers);
        self.active = false;
    }

    /// [`reset`](Self::reset), then unsubscribe everything and let the
    /// policy release its own registrations.
    pub fn clean_up(&mut self, timers: &mut TimerQueue) {
        self.reset(timers);
        self.subscriptions.clear();
        self.policy.clean_up();
        debug!(actor = %self.actor, "driver cleaned up");
    }

    /// Record a signal; the next cycle's conditions will contain it once.
    pub fn raise_signal(&mut self, name: impl Into<String>) {
        self.context.raise_signal(name);
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn context(&self) -> &ConditionContext {
        &self.context
    }

    pub fn global(&self) -> &Blackboard {
        &self.context.global
    }

    pub fn global_mut(&mut self) -> &mut Blackboard {
        &mut self.context.global
    }

    /// Evaluation cycles run since creation.  Survives `reset`.
    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    pub fn start_delay(&self) -> u64 {
        self.start_delay
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }
}
