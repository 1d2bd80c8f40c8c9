use npc_core::SceneNodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnimError {
    #[error("scene node {0} not found")]
    UnknownNode(SceneNodeId),

    #[error("scene node {0} has no animation player")]
    NoPlayer(SceneNodeId),

    #[error("clip library parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AnimResult<T> = Result<T, AnimError>;
