//! `npc-core` — foundational types for the npc behavior/animation framework.
//!
//! This crate is a dependency of every other `npc-*` crate.  It has no
//! `npc-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `ActorId`, `SceneNodeId`, `ScheduleId`, `TimerId`, `MoveId` |
//! | [`grid`]        | `Cell`, grid distances                                     |
//! | [`time`]        | `Tick`, `Clock`, `RuntimeConfig`                           |
//! | [`rng`]         | `ActorRng` (per-actor), `SimRng` (global)                  |
//! | [`error`]       | `NpcError`, `NpcResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod grid;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{NpcError, NpcResult};
pub use grid::Cell;
pub use ids::{ActorId, MoveId, SceneNodeId, ScheduleId, TimerId};
pub use rng::{ActorRng, SimRng};
pub use time::{Clock, RuntimeConfig, Tick};
