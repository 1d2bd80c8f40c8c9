//! `TimerQueue` — sparse tick-keyed timer queue with cancellation.
//!
//! Timers are stored in a `BTreeMap<Tick, Vec<TimerEntry>>` so draining the
//! due set is O(log W) in the number of distinct deadlines.  Cancelling only
//! removes the id from the live set; the stale entry is skipped when its tick
//! is drained.

use std::collections::{BTreeMap, HashSet};

use npc_core::{ActorId, Tick, TimerId};

/// What a timer means to the driver that armed it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// One-shot start delay before the first evaluation.
    Start,
    /// Recurring evaluation; re-armed by the driver after each run.
    Interval,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerEntry {
    pub id:    TimerId,
    pub actor: ActorId,
    pub kind:  TimerKind,
    pub due:   Tick,
}

#[derive(Default)]
pub struct TimerQueue {
    inner:   BTreeMap<Tick, Vec<TimerEntry>>,
    live:    HashSet<TimerId>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for `actor` firing at `due`.
    pub fn schedule(&mut self, due: Tick, actor: ActorId, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.inner.entry(due).or_default().push(TimerEntry { id, actor, kind, due });
        self.live.insert(id);
        id
    }

    /// Cancel `id`.  Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Remove and return every live timer due at or before `now`, ordered by
    /// deadline then arming order.
    pub fn drain_due(&mut self, now: Tick) -> Vec<TimerEntry> {
        let later = self.inner.split_off(&now.offset(1));
        let due = std::mem::replace(&mut self.inner, later);
        due.into_values()
            .flatten()
            .filter(|e| self.live.remove(&e.id))
            .collect()
    }

    /// The earliest tick holding a live timer.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner
            .iter()
            .find(|(_, entries)| entries.iter().any(|e| self.live.contains(&e.id)))
            .map(|(tick, _)| *tick)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
