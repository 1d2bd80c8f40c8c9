use npc_core::{Cell, MoveId, ScheduleId};
use tracing::trace;

use crate::{ConditionContext, Env, Gait, MoveStatus, Task};

/// Walk (or run) the actor to `target`.
///
/// Finishes once the move it issued is over, whether the actor arrived or
/// the world gave up.  While waiting, the move is re-issued whenever the
/// actor is standing still or heading somewhere else.
pub struct GoToPositionTask {
    target:           Cell,
    gait:             Gait,
    ignore_obstacles: bool,
    pending:          Option<MoveId>,
    reached:          bool,
    schedule:         Option<ScheduleId>,
}

impl GoToPositionTask {
    pub fn new(target: Cell) -> Self {
        Self {
            target,
            gait:             Gait::Walk,
            ignore_obstacles: true,
            pending:          None,
            reached:          false,
            schedule:         None,
        }
    }

    pub fn running(mut self, run: bool) -> Self {
        self.gait = if run { Gait::Run } else { Gait::Walk };
        self
    }

    pub fn ignore_obstacles(mut self, ignore: bool) -> Self {
        self.ignore_obstacles = ignore;
        self
    }

    pub fn target(&self) -> Cell {
        self.target
    }

    pub fn schedule(&self) -> Option<ScheduleId> {
        self.schedule
    }
}

impl Task for GoToPositionTask {
    fn execute(&mut self, _ctx: &mut ConditionContext, env: &mut Env<'_>) -> bool {
        if self.reached {
            return true;
        }
        if let Some(id) = self.pending {
            let status = env.world.move_status(id);
            if status.is_done() {
                trace!(actor = %env.actor, target = %self.target, ?status, "move over");
                self.reached = true;
                return true;
            }
        }

        let heading_here = env.world.is_moving(env.actor)
            && env.world.destination(env.actor).is_some_and(|d| d.is_close(self.target, 0));
        if !heading_here {
            self.pending = Some(env.world.move_to(env.actor, self.target, self.gait, self.ignore_obstacles));
        }
        false
    }

    fn bind(&mut self, schedule: ScheduleId) {
        self.schedule = Some(schedule);
    }

    fn label(&self) -> &str {
        "go_to_position"
    }
}
