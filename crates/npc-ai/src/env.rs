//! The world collaborator and the per-call environment handed to policies
//! and tasks.

use npc_anim::Animator;
use npc_core::{ActorId, ActorRng, Cell, MoveId, SceneNodeId, Tick};

use crate::{AiError, AiResult};

// ── World ─────────────────────────────────────────────────────────────────────

/// Movement speed requested for a move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Gait {
    #[default]
    Walk,
    Run,
}

/// Progress of one movement request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveStatus {
    InProgress,
    Arrived,
    /// The move ended without reaching the target (blocked, replaced,
    /// stopped, or never started).
    Failed,
}

impl MoveStatus {
    pub fn is_done(self) -> bool {
        self != MoveStatus::InProgress
    }
}

/// A reachable cell and its path distance from the actor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellCandidate {
    pub cell:     Cell,
    pub distance: u32,
}

/// Scene/world queries and movement, owned outside the scheduler.
///
/// Path search and obstacle handling are the implementor's business; tasks
/// only issue moves and poll their status.
pub trait World {
    fn position(&self, actor: ActorId) -> Option<Cell>;

    /// Cells reachable from the actor's position without crossing obstacles,
    /// at most `radius` steps away.
    fn passable_cells(&self, actor: ActorId, radius: u32) -> Vec<CellCandidate>;

    fn is_moving(&self, actor: ActorId) -> bool;

    /// Target of the actor's current move, if moving.
    fn destination(&self, actor: ActorId) -> Option<Cell>;

    /// Start moving `actor` to `target`, replacing any move in flight.
    fn move_to(&mut self, actor: ActorId, target: Cell, gait: Gait, ignore_obstacles: bool) -> MoveId;

    fn move_status(&self, id: MoveId) -> MoveStatus;

    fn stop_moving(&mut self, actor: ActorId);

    /// Advance movement to `now`.  Called once per runtime tick.
    fn advance(&mut self, _now: Tick) {}
}

/// A world where nothing moves.  Every move request fails immediately.
#[derive(Debug, Default)]
pub struct NoWorld {
    next_move: u64,
}

impl World for NoWorld {
    fn position(&self, _actor: ActorId) -> Option<Cell> {
        None
    }

    fn passable_cells(&self, _actor: ActorId, _radius: u32) -> Vec<CellCandidate> {
        Vec::new()
    }

    fn is_moving(&self, _actor: ActorId) -> bool {
        false
    }

    fn destination(&self, _actor: ActorId) -> Option<Cell> {
        None
    }

    fn move_to(&mut self, _actor: ActorId, _target: Cell, _gait: Gait, _ignore_obstacles: bool) -> MoveId {
        self.next_move += 1;
        MoveId(self.next_move)
    }

    fn move_status(&self, _id: MoveId) -> MoveStatus {
        MoveStatus::Failed
    }

    fn stop_moving(&mut self, _actor: ActorId) {}
}

// ── Env ───────────────────────────────────────────────────────────────────────

/// Mutable access to everything an actor's behavior may touch during one
/// evaluation cycle.
///
/// Built by the runtime per driver call; borrows live for that call only.
pub struct Env<'a> {
    pub now:      Tick,
    pub actor:    ActorId,
    /// Root scene node of the actor's animated model.
    pub model:    Option<SceneNodeId>,
    pub animator: &'a mut Animator,
    pub world:    &'a mut dyn World,
    pub rng:      &'a mut ActorRng,
}

impl<'a> Env<'a> {
    pub fn new(
        now:      Tick,
        actor:    ActorId,
        model:    Option<SceneNodeId>,
        animator: &'a mut Animator,
        world:    &'a mut dyn World,
        rng:      &'a mut ActorRng,
    ) -> Self {
        Self { now, actor, model, animator, world, rng }
    }

    /// The actor's model node, or [`AiError::NoModel`].
    pub fn model(&self) -> AiResult<SceneNodeId> {
        self.model.ok_or(AiError::NoModel(self.actor))
    }

    pub fn is_moving(&self) -> bool {
        self.world.is_moving(self.actor)
    }
}
