//! `Schedule` — an ordered task list guarded by interrupt conditions.
//!
//! # Completion
//!
//! ```text
//! is_completed = any positive interrupt present in ctx.conditions
//!             || any negative interrupt absent from ctx.conditions
//!             || every task finished
//! ```
//!
//! # Execution
//!
//! A cursor points at the first unfinished task.  Each `execute` polls that
//! task once; if it finishes the cursor moves on and the call returns.  So at
//! most one task finishes per call, finished tasks are never polled again,
//! and an unfinished task is resumed (never restarted) next cycle.

use std::sync::atomic::{AtomicU64, Ordering};

use npc_core::ScheduleId;
use tracing::trace;

use crate::{ConditionContext, Env, Task};

static NEXT_SCHEDULE: AtomicU64 = AtomicU64::new(0);

pub struct Schedule {
    id:             ScheduleId,
    label:          String,
    tasks:          Vec<Box<dyn Task>>,
    cursor:         usize,
    interrupts:     Vec<String>,
    neg_interrupts: Vec<String>,
    all_finished:   bool,
}

impl Schedule {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id:             ScheduleId(NEXT_SCHEDULE.fetch_add(1, Ordering::Relaxed)),
            label:          label.into(),
            tasks:          Vec::new(),
            cursor:         0,
            interrupts:     Vec::new(),
            neg_interrupts: Vec::new(),
            all_finished:   false,
        }
    }

    pub fn id(&self) -> ScheduleId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Register interrupt names.  With `negate` the schedule ends when any of
    /// them is *absent*; otherwise when any is present.
    pub fn add_interrupts<I, S>(&mut self, names: I, negate: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = if negate { &mut self.neg_interrupts } else { &mut self.interrupts };
        target.extend(names.into_iter().map(Into::into));
    }

    /// Append tasks in execution order, binding each to this schedule.
    pub fn add_tasks<I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = Box<dyn Task>>,
    {
        for mut task in tasks {
            task.bind(self.id);
            self.tasks.push(task);
        }
    }

    /// Builder-style single [`add_tasks`](Self::add_tasks).
    pub fn then(mut self, task: impl Task + 'static) -> Self {
        self.add_tasks([Box::new(task) as Box<dyn Task>]);
        self
    }

    /// Builder-style positive [`add_interrupts`](Self::add_interrupts).
    pub fn interrupted_by<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_interrupts(names, false);
        self
    }

    /// Builder-style negative [`add_interrupts`](Self::add_interrupts).
    pub fn while_present<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_interrupts(names, true);
        self
    }

    // ── Evaluation ────────────────────────────────────────────────────────

    /// The condition that ends this schedule, if any.
    pub fn interrupt_cause<'c>(&'c self, ctx: &'c ConditionContext) -> Option<&'c str> {
        if let Some(hit) = ctx.conditions().iter().find(|c| self.interrupts.contains(*c)) {
            return Some(hit.as_str());
        }
        self.neg_interrupts
            .iter()
            .find(|n| !ctx.has_condition(n))
            .map(String::as_str)
    }

    pub fn is_completed(&self, ctx: &ConditionContext) -> bool {
        self.interrupt_cause(ctx).is_some() || self.all_finished
    }

    /// Poll the current task.  Returns `true` once every task has finished.
    pub fn execute(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) -> bool {
        if let Some(task) = self.tasks.get_mut(self.cursor) {
            if task.execute(ctx, env) {
                trace!(schedule = %self.label, task = task.label(), index = self.cursor, "task finished");
                self.cursor += 1;
            }
        }
        self.all_finished = self.cursor >= self.tasks.len();
        self.all_finished
    }

    pub fn is_finished(&self) -> bool {
        self.all_finished
    }

    pub fn finished_count(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("tasks", &self.tasks.len())
            .field("cursor", &self.cursor)
            .field("interrupts", &self.interrupts)
            .field("neg_interrupts", &self.neg_interrupts)
            .field("all_finished", &self.all_finished)
            .finish()
    }
}
