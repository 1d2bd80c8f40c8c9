//! `GridWorld` — a bounded tile map with straight-line, timed movement.
//!
//! Movement follows a teleport-at-arrival model: a moving actor logically
//! stays on its departure cell until the arrival tick, then appears on the
//! target cell.  Travel time is the Chebyshev distance times the gait's pace.
//! There is no path search; a move into a blocked or out-of-bounds cell fails
//! unless the caller asked to ignore obstacles (bounds are always enforced).
//!
//! Only each actor's latest move keeps a status entry.  Issuing a new move,
//! stopping, or re-placing the actor drops the previous entry, and any id
//! without an entry reads as `Failed`, so the status table never holds more
//! than one entry per actor.

use std::collections::BTreeMap;
#[cfg(not(feature = "fx-hash"))]
use std::collections::HashSet;

#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashSet as HashSet;

use npc_ai::{CellCandidate, Gait, MoveStatus, World};
use npc_core::{ActorId, Cell, MoveId, Tick};
use tracing::trace;

/// One move in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Journey {
    to:      Cell,
    arrival: Tick,
}

#[derive(Clone, Debug)]
struct Mover {
    position: Cell,
    journey:  Option<Journey>,
    /// Latest move issued for this actor; its status is still tracked.
    last:     Option<MoveId>,
}

pub struct GridWorld {
    width:     i32,
    height:    i32,
    blocked:   HashSet<Cell>,
    actors:    Vec<Option<Mover>>,
    statuses:  BTreeMap<MoveId, MoveStatus>,
    next_move: MoveId,
    now:       Tick,
    walk_pace: u64,
    run_pace:  u64,
}

impl GridWorld {
    /// An empty `width × height` map.  Walking takes 2 ticks per cell,
    /// running 1.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            blocked:   HashSet::default(),
            actors:    Vec::new(),
            statuses:  BTreeMap::new(),
            next_move: MoveId(0),
            now:       Tick::ZERO,
            walk_pace: 2,
            run_pace:  1,
        }
    }

    pub fn with_paces(mut self, walk: u64, run: u64) -> Self {
        self.walk_pace = walk.max(1);
        self.run_pace = run.max(1);
        self
    }

    pub fn block(&mut self, cell: Cell) {
        self.blocked.insert(cell);
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.blocked.contains(&cell)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    /// Put `actor` on `cell`, cancelling any move it had in flight.
    pub fn place(&mut self, actor: ActorId, cell: Cell) {
        if self.actors.len() <= actor.index() {
            self.actors.resize_with(actor.index() + 1, || None);
        }
        if let Some(old) = self.actors[actor.index()].take() {
            if let Some(id) = old.last {
                self.statuses.remove(&id);
            }
        }
        self.actors[actor.index()] = Some(Mover { position: cell, journey: None, last: None });
    }

    /// Tick at which `actor`'s current move lands.
    pub fn arrival_tick(&self, actor: ActorId) -> Option<Tick> {
        self.mover(actor)?.journey.as_ref().map(|j| j.arrival)
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Number of moves whose status is still tracked.
    pub fn tracked_moves(&self) -> usize {
        self.statuses.len()
    }

    fn mover(&self, actor: ActorId) -> Option<&Mover> {
        self.actors.get(actor.index())?.as_ref()
    }

    fn next_id(&mut self) -> MoveId {
        let id = self.next_move;
        self.next_move = id.next();
        id
    }

    fn pace(&self, gait: Gait) -> u64 {
        match gait {
            Gait::Walk => self.walk_pace,
            Gait::Run => self.run_pace,
        }
    }
}

impl World for GridWorld {
    fn position(&self, actor: ActorId) -> Option<Cell> {
        self.mover(actor).map(|m| m.position)
    }

    /// In-bounds, unblocked cells within `radius` (Chebyshev), nearest first.
    /// The actor's own cell is excluded.
    fn passable_cells(&self, actor: ActorId, radius: u32) -> Vec<CellCandidate> {
        let Some(origin) = self.position(actor) else {
            return Vec::new();
        };
        let r = radius as i32;
        let mut cells: Vec<CellCandidate> = (origin.y - r..=origin.y + r)
            .flat_map(|y| (origin.x - r..=origin.x + r).map(move |x| Cell::new(x, y)))
            .filter(|&c| c != origin && self.in_bounds(c) && !self.is_blocked(c))
            .map(|cell| CellCandidate { cell, distance: origin.chebyshev(cell) })
            .collect();
        cells.sort_by_key(|c| (c.distance, c.cell.y, c.cell.x));
        cells
    }

    fn is_moving(&self, actor: ActorId) -> bool {
        self.mover(actor).is_some_and(|m| m.journey.is_some())
    }

    fn destination(&self, actor: ActorId) -> Option<Cell> {
        self.mover(actor)?.journey.as_ref().map(|j| j.to)
    }

    fn move_to(&mut self, actor: ActorId, target: Cell, gait: Gait, ignore_obstacles: bool) -> MoveId {
        let id = self.next_id();
        let now = self.now;
        let pace = self.pace(gait);
        let refused = !self.in_bounds(target) || (!ignore_obstacles && self.is_blocked(target));

        let Some(Some(mover)) = self.actors.get_mut(actor.index()) else {
            return id;
        };
        mover.journey = None;
        if let Some(prev) = mover.last.take() {
            self.statuses.remove(&prev);
        }
        if refused {
            trace!(%actor, %target, "move refused");
            return id;
        }

        let from = mover.position;
        mover.last = Some(id);
        if from == target {
            self.statuses.insert(id, MoveStatus::Arrived);
            return id;
        }

        let arrival = now + (from.chebyshev(target) as u64 * pace).max(1);
        mover.journey = Some(Journey { to: target, arrival });
        self.statuses.insert(id, MoveStatus::InProgress);
        trace!(%actor, %from, %target, %arrival, "move started");
        id
    }

    fn move_status(&self, id: MoveId) -> MoveStatus {
        self.statuses.get(&id).copied().unwrap_or(MoveStatus::Failed)
    }

    fn stop_moving(&mut self, actor: ActorId) {
        let Some(Some(mover)) = self.actors.get_mut(actor.index()) else {
            return;
        };
        if mover.journey.take().is_some() {
            if let Some(id) = mover.last.take() {
                self.statuses.remove(&id);
            }
        }
    }

    fn advance(&mut self, now: Tick) {
        self.now = now;
        for mover in self.actors.iter_mut().flatten() {
            if mover.journey.as_ref().is_some_and(|j| j.arrival <= now) {
                if let (Some(journey), Some(id)) = (mover.journey.take(), mover.last) {
                    mover.position = journey.to;
                    self.statuses.insert(id, MoveStatus::Arrived);
                }
            }
        }
    }
}
