//! `npc-ai` — condition-interrupted behavior scheduling.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`context`]  | `ConditionContext`, `Value`, `Blackboard`                       |
//! | [`signal`]   | `SignalBus`, `Subscription` (RAII)                              |
//! | [`timer`]    | `TimerQueue`, `TimerEntry`, `TimerKind`                         |
//! | [`env`]      | `World` trait, `NoWorld`, `Env<'a>` per-call environment        |
//! | [`task`]     | `Task` trait                                                    |
//! | [`schedule`] | `Schedule` — ordered tasks plus interrupts                      |
//! | [`policy`]   | `BehaviorPolicy` trait                                          |
//! | [`driver`]   | `BehaviorDriver<P>` — timers, cycle ordering, signal folding    |
//! | [`tasks`]    | `PlayAnimationTask`, `GoToPositionTask`                         |
//! | [`noop`]     | `NoopPolicy`, `NoopTask`                                        |
//! | [`error`]    | `AiError`, `AiResult<T>`                                        |
//!
//! # Design notes
//!
//! One evaluation cycle of a driver runs, in this order:
//!
//! 1. Fold signals received since the last cycle into the context, then roll
//!    the context forward (`global` survives, signals become conditions).
//! 2. `BehaviorPolicy::gather_conditions`.
//! 3. If there is no schedule or it is completed (interrupt or all tasks
//!    finished), `BehaviorPolicy::select_new_schedule`.
//! 4. `pre_think` → `Schedule::execute` (one task poll) → `post_think`.
//!
//! Everything is single-threaded.  Tasks never block: they start work,
//! return `false`, and read the outcome on a later poll.

pub mod context;
pub mod driver;
pub mod env;
pub mod error;
pub mod noop;
pub mod policy;
pub mod schedule;
pub mod signal;
pub mod task;
pub mod tasks;
pub mod timer;

#[cfg(test)]
mod tests;

pub use context::{Blackboard, ConditionContext, Value};
pub use driver::BehaviorDriver;
pub use env::{CellCandidate, Env, Gait, MoveStatus, NoWorld, World};
pub use error::{AiError, AiResult};
pub use noop::{NoopPolicy, NoopTask};
pub use policy::BehaviorPolicy;
pub use schedule::Schedule;
pub use signal::{SignalBus, Subscription};
pub use task::Task;
pub use tasks::{GoToPositionTask, PlayAnimationTask};
pub use timer::{TimerEntry, TimerKind, TimerQueue};
