use npc_ai::AiError;
use npc_anim::AnimError;
use npc_core::NpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match actor count {expected}")]
    CountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error(transparent)]
    Core(#[from] NpcError),

    #[error("animation error: {0}")]
    Anim(#[from] AnimError),

    #[error("behavior error: {0}")]
    Ai(#[from] AiError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
