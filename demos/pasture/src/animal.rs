//! A farm animal: idles, wanders while working, reacts to being dragged.

use npc_ai::{
    BehaviorPolicy, ConditionContext, Env, GoToPositionTask, PlayAnimationTask, Schedule, SignalBus,
    Subscription, Value,
};
use npc_anim::Repeat;
use tracing::debug;

// ── Conditions and signals ────────────────────────────────────────────────────

pub const IN_DRAG:       &str = "inDrag";
pub const STATE_CHANGED: &str = "stateChanged";
pub const DRAG_COLLIDE:  &str = "onDragCollide";

/// Signals the demo raises per animal.
pub const DRAG_START:    &str = "dragStart";
pub const DRAG_END:      &str = "dragEnd";
pub const COLLIDED:      &str = "collided";
pub const PRODUCT_READY: &str = "productReady";

/// Broadcast on the shared bus whenever the player drags anything.
pub const SOMETHING_DRAGGED: &str = "somethingDragged";

const PRODUCT_COMPLETED: &str = "productCompleted";

/// Animal behavior.
///
/// | State                | Schedule                                              |
/// |----------------------|-------------------------------------------------------|
/// | bumped while working | walk away to a random nearby cell                     |
/// | working, not dragged | optional drag-finish, idle ×3, maybe wander somewhere |
/// | dragged              | drag-start then drag-idle while `inDrag` holds        |
/// | product completed    | sleep-start then sleep-idle                           |
/// | otherwise            | idle forever                                          |
///
/// `stateChanged` toggles between working and waiting.
#[derive(Clone, Debug)]
pub struct AnimalPolicy {
    pub movement_radius: u32,
    working:             bool,
    in_drag:             bool,
    collided:            bool,
    prev_state_wait:     bool,
    drag_start_played:   bool,
    something_dragged:   bool,
}

impl Default for AnimalPolicy {
    fn default() -> Self {
        Self {
            movement_radius:   3,
            working:           false,
            in_drag:           false,
            collided:          false,
            prev_state_wait:   false,
            drag_start_played: false,
            something_dragged: false,
        }
    }
}

impl AnimalPolicy {
    pub fn working() -> Self {
        Self { working: true, ..Self::default() }
    }

    fn away_schedule(&self, env: &mut Env<'_>) -> Schedule {
        let mut schedule = Schedule::new("away").interrupted_by([STATE_CHANGED, IN_DRAG, DRAG_COLLIDE]);
        let cells = env.world.passable_cells(env.actor, self.movement_radius);
        if let Some(dest) = env.rng.choose(&cells) {
            schedule = schedule.then(GoToPositionTask::new(dest.cell).running(true));
        }
        schedule
    }

    fn wander_schedule(&mut self, ctx: &ConditionContext, env: &mut Env<'_>) -> Schedule {
        if self.something_dragged {
            debug!(actor = %ctx.actor(), "something was dragged nearby");
        }
        self.something_dragged = false;
        let mut schedule = Schedule::new("wander").interrupted_by([STATE_CHANGED, IN_DRAG, DRAG_COLLIDE]);

        let has_sleep = has_clip(env, "sleep_idle");
        if self.drag_start_played {
            self.drag_start_played = false;
            schedule = schedule.then(PlayAnimationTask::new("drag_finish").with_repeat(Repeat::Times(1)));
        } else if self.prev_state_wait && has_sleep {
            self.prev_state_wait = false;
            schedule = schedule
                .then(PlayAnimationTask::new("eat").with_repeat(Repeat::Times(1)))
                .then(PlayAnimationTask::new("jump").with_repeat(Repeat::Times(2)));
        }
        schedule = schedule.then(PlayAnimationTask::new("idle").with_repeat(Repeat::Times(3)));

        let cells = env.world.passable_cells(env.actor, self.movement_radius);
        if cells.len() > 1 {
            if let Some(dest) = env.rng.choose(&cells) {
                let run = env.rng.gen_bool(0.2);
                schedule = schedule.then(GoToPositionTask::new(dest.cell).running(run));
            }
        }
        schedule
    }

    fn idle_schedule(&mut self, ctx: &ConditionContext, env: &mut Env<'_>) -> Schedule {
        if self.in_drag && has_clip(env, "drag_idle") {
            self.drag_start_played = true;
            return Schedule::new("dragged")
                .while_present([IN_DRAG])
                .then(
                    PlayAnimationTask::new("drag_start")
                        .with_repeat(Repeat::Times(1))
                        .no_interrupt("drag_idle"),
                )
                .then(PlayAnimationTask::new("drag_idle"));
        }

        let mut schedule = Schedule::new("idle").interrupted_by([STATE_CHANGED, IN_DRAG, DRAG_COLLIDE]);
        if self.drag_start_played {
            self.drag_start_played = false;
            schedule = schedule.then(PlayAnimationTask::new("drag_finish").with_repeat(Repeat::Times(1)));
        }

        let product_completed = ctx.global.get(PRODUCT_COMPLETED).and_then(Value::as_bool) == Some(true);
        if product_completed && has_clip(env, "sleep_idle") {
            return schedule
                .then(
                    PlayAnimationTask::new("sleep_start")
                        .with_repeat(Repeat::Times(1))
                        .no_interrupt("sleep_idle"),
                )
                .then(PlayAnimationTask::new("sleep_idle"));
        }
        schedule.then(PlayAnimationTask::new("idle").with_repeat(Repeat::Forever))
    }
}

fn has_clip(env: &Env<'_>, clip: &str) -> bool {
    env.model.is_some_and(|m| env.animator.has_clip(m, clip))
}

impl BehaviorPolicy for AnimalPolicy {
    fn gather_conditions(&mut self, ctx: &mut ConditionContext, _env: &mut Env<'_>) {
        if ctx.has_condition(DRAG_START) {
            self.in_drag = true;
        }
        if ctx.has_condition(DRAG_END) {
            self.in_drag = false;
        }
        if ctx.has_condition(COLLIDED) {
            self.collided = true;
        }
        if ctx.has_condition(SOMETHING_DRAGGED) {
            self.something_dragged = true;
        }
        if ctx.has_condition(PRODUCT_READY) {
            ctx.global.insert(PRODUCT_COMPLETED.into(), Value::Bool(true));
        }
        if ctx.has_condition(STATE_CHANGED) {
            self.prev_state_wait = !self.working;
            self.working = !self.working;
            if self.working {
                ctx.global.remove(PRODUCT_COMPLETED);
            }
        }

        if self.in_drag {
            ctx.add_condition(IN_DRAG);
        }
        if self.collided && self.working {
            ctx.add_condition(DRAG_COLLIDE);
        }
    }

    fn select_new_schedule(&mut self, ctx: &mut ConditionContext, env: &mut Env<'_>) -> Option<Schedule> {
        if env.model.is_none() {
            return None;
        }

        if ctx.has_condition(STATE_CHANGED) && env.is_moving() {
            env.world.stop_moving(env.actor);
        }

        if self.collided {
            self.collided = false;
            if env.is_moving() {
                env.world.stop_moving(env.actor);
            }
            if self.working {
                return Some(self.away_schedule(env));
            }
        }

        if self.working && !self.in_drag {
            return Some(self.wander_schedule(ctx, env));
        }
        Some(self.idle_schedule(ctx, env))
    }

    fn subscribe(&mut self, bus: &SignalBus) -> Vec<Subscription> {
        vec![bus.subscribe([SOMETHING_DRAGGED])]
    }
}
