//! Framework error type.
//!
//! Sub-crates define their own error enums and either convert them into
//! `NpcError` via `From` impls or wrap `NpcError` as one variant.

use thiserror::Error;

use crate::{ActorId, SceneNodeId};

/// The top-level error type for `npc-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum NpcError {
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),

    #[error("scene node {0} not found")]
    SceneNodeNotFound(SceneNodeId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `npc-*` crates.
pub type NpcResult<T> = Result<T, NpcError>;
