//! `npc-anim` — hierarchical animation playback for the npc framework.
//!
//! An [`Animator`] owns a [`SceneGraph`] and one optional player per scene
//! node.  Playing a clip on a node plays it on every descendant player within
//! [`AnimatorConfig::max_depth`] levels, and the caller's completion callback
//! fires exactly once with the most severe [`StopReason`] any participant
//! reported.
//!
//! # What lives here
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`meta`]    | `AnimationMeta`, `Repeat`, `WrapMode`, `SoundCue`, `ClipLibrary` |
//! | [`reason`]  | `StopReason`, `Outcome`                                       |
//! | [`backend`] | `ClipBackend` trait, `TimelineBackend`                        |
//! | [`scene`]   | `SceneGraph`, `SceneNode`                                     |
//! | [`player`]  | `Animator`, `AnimatorConfig`, `OnComplete`                    |
//! | [`random`]  | pattern runs (`Animator::play_random_with_pattern`)           |
//! | [`loader`]  | JSON / CSV clip-library loaders                               |
//! | [`error`]   | `AnimError`, `AnimResult`                                     |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                      |
//! |-----------|-------------------------------------------------------------|
//! | `serde`   | `Serialize`/`Deserialize` on descriptors and config.        |
//! | `fx-hash` | FxHash instead of SipHash for clip-name lookup.             |

pub mod backend;
pub mod error;
pub mod loader;
pub mod meta;
pub mod player;
pub mod random;
pub mod reason;
pub mod scene;


// ── Hash map selection ────────────────────────────────────────────────────────

#[cfg(feature = "fx-hash")]
pub(crate) type ClipMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(not(feature = "fx-hash"))]
pub(crate) type ClipMap<K, V> = std::collections::HashMap<K, V>;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use backend::{ClipBackend, PassFinished, TimelineBackend};
pub use error::{AnimError, AnimResult};
pub use loader::{load_library_csv, load_library_csv_reader, load_library_json, load_library_json_reader};
pub use meta::{AnimationMeta, ClipLibrary, PlaybackParams, Repeat, SoundCue, WrapMode};
pub use player::{Animator, AnimatorConfig, OnComplete};
pub use reason::{Outcome, StopReason};
pub use scene::{SceneGraph, SceneNode};
