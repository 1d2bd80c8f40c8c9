use npc_anim::AnimError;
use npc_core::ActorId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("actor {0} has no animated model")]
    NoModel(ActorId),

    #[error("animation error: {0}")]
    Anim(#[from] AnimError),
}

pub type AiResult<T> = Result<T, AiError>;
