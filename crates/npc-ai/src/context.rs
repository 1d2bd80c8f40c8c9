//! Per-cycle condition context handed to policies, schedules and tasks.

use std::collections::HashMap;

use npc_core::ActorId;

/// A small closed set of blackboard values.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// String-keyed value store.
pub type Blackboard = HashMap<String, Value>;

/// The view of the world one evaluation cycle works with.
///
/// | Field        | Lifetime                                                    |
/// |--------------|-------------------------------------------------------------|
/// | `conditions` | this cycle; seeded from the previous cycle's signals        |
/// | `signals`    | raised during this cycle; become next cycle's conditions    |
/// | `global`     | moved from cycle to cycle, never reset by the driver        |
/// | `local`      | this cycle only                                             |
///
/// `conditions` and `signals` are ordered sets: adding a name twice keeps the
/// first occurrence.
#[derive(Clone, Debug)]
pub struct ConditionContext {
    actor:      ActorId,
    conditions: Vec<String>,
    signals:    Vec<String>,
    pub global: Blackboard,
    pub local:  Blackboard,
}

impl ConditionContext {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            conditions: Vec::new(),
            signals:    Vec::new(),
            global:     Blackboard::new(),
            local:      Blackboard::new(),
        }
    }

    /// Build the next cycle's context: `global` moves forward, pending
    /// signals become conditions, everything else starts empty.
    pub fn next_cycle(&mut self) -> ConditionContext {
        let mut next = ConditionContext::new(self.actor);
        next.global = std::mem::take(&mut self.global);
        for signal in self.signals.drain(..) {
            push_unique(&mut next.conditions, signal);
        }
        next
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.iter().any(|c| c == name)
    }

    pub fn add_condition(&mut self, name: impl Into<String>) {
        push_unique(&mut self.conditions, name.into());
    }

    pub fn signals(&self) -> &[String] {
        &self.signals
    }

    /// Queue `name` for the next cycle's conditions.
    pub fn raise_signal(&mut self, name: impl Into<String>) {
        push_unique(&mut self.signals, name.into());
    }
}

fn push_unique(set: &mut Vec<String>, name: String) {
    if !set.contains(&name) {
        set.push(name);
    }
}
