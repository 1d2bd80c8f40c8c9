//! `npc-sim` — the runtime that ties behavior drivers, timers, the animator
//! and the world together.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① World     — World::advance(tick): moves land, statuses update.
//!   ② Animation — Animator::advance(1): finished passes resolve, completion
//!                 callbacks run.
//!   ③ Timers    — drain every timer due at `tick` and route it to the
//!                 owning BehaviorDriver (start delay → arm interval;
//!                 interval → one evaluation cycle, then re-arm).
//! ```
//!
//! Everything runs on the caller's thread; drivers never overlap.
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `serde`   | Serde derives on configuration and id types.               |
//! | `fx-hash` | FxHash for the grid world's obstacle set and clip indexes. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use npc_ai::NoopPolicy;
//! use npc_core::RuntimeConfig;
//! use npc_sim::{GridWorld, NoopObserver, RuntimeBuilder};
//!
//! let mut runtime = RuntimeBuilder::new(config, animator, GridWorld::new(16, 16))
//!     .policies(vec![NoopPolicy; 4])
//!     .build()?;
//! runtime.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod runtime;
pub mod world;

#[cfg(test)]
mod tests;

pub use builder::RuntimeBuilder;
pub use error::{RuntimeError, RuntimeResult};
pub use observer::{ActorSnapshot, NoopObserver, RuntimeObserver};
pub use runtime::Runtime;
pub use world::GridWorld;
