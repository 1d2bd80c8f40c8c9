//! Stock tasks.

mod go_to;
mod play_animation;

pub use go_to::GoToPositionTask;
pub use play_animation::PlayAnimationTask;
