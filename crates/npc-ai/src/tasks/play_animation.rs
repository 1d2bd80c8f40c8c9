use std::cell::Cell;
use std::rc::Rc;

use npc_anim::{OnComplete, Repeat};
use npc_core::{ScheduleId, Tick};
use tracing::{trace, warn};

use crate::{ConditionContext, Env, Task};

/// Play a random clip matching `pattern` on the actor's model.
///
/// The first poll waits while the actor is moving, then starts playback
/// unless the clip currently playing contains the `no_interrupt` fragment.
/// With a duration the task finishes once that many ticks have passed since
/// it started; without one it finishes when the animation run completes,
/// when the model stops playing, or when the current clip no longer starts
/// with `pattern` (a protected clip kept playing, or `next` chained away).
pub struct PlayAnimationTask {
    pattern:      String,
    duration:     Option<u64>,
    repeat:       Repeat,
    no_interrupt: Option<String>,
    started_at:   Option<Tick>,
    finished:     Rc<Cell<bool>>,
    schedule:     Option<ScheduleId>,
}

impl PlayAnimationTask {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern:      pattern.into(),
            duration:     None,
            repeat:       Repeat::FromConfig,
            no_interrupt: None,
            started_at:   None,
            finished:     Rc::default(),
            schedule:     None,
        }
    }

    /// Finish after `ticks` ticks regardless of the animation.
    pub fn with_duration(mut self, ticks: u64) -> Self {
        self.duration = (ticks > 0).then_some(ticks);
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Leave the current clip alone if its name contains `fragment`.
    pub fn no_interrupt(mut self, fragment: impl Into<String>) -> Self {
        self.no_interrupt = Some(fragment.into());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn schedule(&self) -> Option<ScheduleId> {
        self.schedule
    }

    fn start(&mut self, env: &mut Env<'_>) {
        let model = match env.model() {
            Ok(model) => model,
            Err(err) => {
                warn!(actor = %env.actor, %err, "nothing to animate");
                self.finished.set(true);
                return;
            }
        };

        let protected = match (&self.no_interrupt, env.animator.current_clip(model)) {
            (Some(fragment), Some(current)) => current.contains(fragment.as_str()),
            _ => false,
        };
        if protected {
            trace!(actor = %env.actor, pattern = %self.pattern, "current clip not interruptible");
            return;
        }

        let on_complete: Option<OnComplete> = if self.duration.is_some() {
            None
        } else {
            let finished = Rc::clone(&self.finished);
            Some(Box::new(move |_, _| finished.set(true)))
        };
        if let Err(err) = env.animator.play_random_with_pattern(model, &self.pattern, self.repeat, on_complete) {
            warn!(actor = %env.actor, pattern = %self.pattern, %err, "animation request failed");
            self.finished.set(true);
        }
    }
}

impl Task for PlayAnimationTask {
    fn execute(&mut self, _ctx: &mut ConditionContext, env: &mut Env<'_>) -> bool {
        let Some(started_at) = self.started_at else {
            if env.is_moving() {
                return false;
            }
            self.start(env);
            self.started_at = Some(env.now);
            return false;
        };

        if let Some(duration) = self.duration {
            return env.now.since(started_at) >= duration;
        }
        if self.finished.get() {
            return true;
        }
        let Some(model) = env.model else { return true };
        // A clip outside our pattern is playing: ours is no longer running.
        match env.animator.current_clip(model) {
            Some(clip) if clip.starts_with(self.pattern.as_str()) => !env.animator.is_playing(model, None),
            _ => true,
        }
    }

    fn bind(&mut self, schedule: ScheduleId) {
        self.schedule = Some(schedule);
    }

    fn label(&self) -> &str {
        "play_animation"
    }
}
