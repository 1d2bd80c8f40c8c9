//! Integration tests for npc-sim.

use std::cell::Cell as Flag;
use std::rc::Rc;

use npc_ai::{
    BehaviorPolicy, ConditionContext, Env, Gait, GoToPositionTask, MoveStatus, NoopPolicy,
    PlayAnimationTask, Schedule, SignalBus, Subscription, World,
};
use npc_anim::{AnimationMeta, Animator, AnimatorConfig, Repeat, SceneGraph, TimelineBackend};
use npc_core::{ActorId, Cell, NpcError, RuntimeConfig, SceneNodeId, Tick};

use crate::{ActorSnapshot, GridWorld, NoopObserver, RuntimeBuilder, RuntimeError, RuntimeObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config(total_ticks: u64) -> RuntimeConfig {
    RuntimeConfig {
        total_ticks,
        seed:                    42,
        think_interval_ticks:    2,
        start_delay_ticks:       1,
        snapshot_interval_ticks: 0,
        ..RuntimeConfig::default()
    }
}

/// An animator with `n` cow models, each knowing a 3-tick "graze" clip.
fn herd(n: usize) -> (Animator, Vec<Option<SceneNodeId>>) {
    let mut scene = SceneGraph::new();
    let models: Vec<SceneNodeId> = (0..n).map(|i| scene.add_root(format!("cow{i}"))).collect();
    let mut backend = TimelineBackend::new();
    for &model in &models {
        backend.add_clip(model, "graze", 3);
    }
    let mut animator = Animator::new(AnimatorConfig::default(), scene, backend);
    for &model in &models {
        animator
            .init(model, [AnimationMeta::new("graze")].into_iter().collect())
            .unwrap();
    }
    (animator, models.into_iter().map(Some).collect())
}

fn pasture(n: usize) -> GridWorld {
    let mut world = GridWorld::new(8, 8);
    for i in 0..n {
        world.place(ActorId(i as u32), Cell::new(0, i as i32));
    }
    world
}

/// Grazes forever, optionally walking somewhere first.  Startles on signal.
#[derive(Default)]
struct Grazer {
    selects: Rc<Flag<u32>>,
    walk_to: Option<Cell>,
}

impl BehaviorPolicy for Grazer {
    fn select_new_schedule(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) -> Option<Schedule> {
        self.selects.set(self.selects.get() + 1);
        let mut schedule = Schedule::new("graze").interrupted_by(["startled"]);
        if let Some(target) = self.walk_to {
            schedule = schedule.then(GoToPositionTask::new(target).ignore_obstacles(false));
        }
        Some(schedule.then(PlayAnimationTask::new("graze").with_repeat(Repeat::Forever)))
    }

    fn subscribe(&mut self, bus: &SignalBus) -> Vec<Subscription> {
        vec![bus.subscribe(["startled"])]
    }
}

#[derive(Default)]
struct Tally {
    ticks:     u64,
    cycles:    usize,
    snapshots: Vec<Tick>,
    ended_at:  Option<Tick>,
    last:      Vec<ActorSnapshot>,
}

impl RuntimeObserver for Tally {
    fn on_tick_end(&mut self, _tick: Tick, cycles: usize) {
        self.ticks += 1;
        self.cycles += cycles;
    }

    fn on_snapshot(&mut self, tick: Tick, actors: &[ActorSnapshot]) {
        self.snapshots.push(tick);
        self.last = actors.to_vec();
    }

    fn on_run_end(&mut self, final_tick: Tick) {
        self.ended_at = Some(final_tick);
    }
}

// ── RuntimeBuilder validation ─────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_and_arms_one_timer_per_actor() {
        let (animator, models) = herd(3);
        let runtime = RuntimeBuilder::new(test_config(10), animator, pasture(3))
            .policies(vec![NoopPolicy; 3])
            .models(models)
            .build()
            .unwrap();
        assert_eq!(runtime.actor_count(), 3);
        assert_eq!(runtime.timers.len(), 3);
        assert_eq!(runtime.timers.next_tick(), Some(Tick(1)));
        assert!(runtime.drivers.iter().all(|d| d.is_active()));
    }

    #[test]
    fn paused_build_arms_nothing() {
        let (animator, _) = herd(2);
        let mut runtime = RuntimeBuilder::new(test_config(10), animator, pasture(2))
            .policies(vec![NoopPolicy; 2])
            .paused()
            .build()
            .unwrap();
        assert!(runtime.timers.is_empty());
        runtime.start_all();
        assert_eq!(runtime.timers.len(), 2);
    }

    #[test]
    fn model_count_mismatch_errors() {
        let (animator, models) = herd(2);
        let result = RuntimeBuilder::new(test_config(10), animator, pasture(3))
            .policies(vec![NoopPolicy; 3])
            .models(models)
            .build();
        assert!(matches!(result, Err(RuntimeError::CountMismatch { what: "models", .. })));
    }

    #[test]
    fn start_delay_count_mismatch_errors() {
        let (animator, _) = herd(1);
        let result = RuntimeBuilder::new(test_config(10), animator, pasture(1))
            .policies(vec![NoopPolicy])
            .start_delays(vec![1, 2])
            .build();
        assert!(matches!(result, Err(RuntimeError::CountMismatch { expected: 1, got: 2, .. })));
    }

    #[test]
    fn unknown_model_node_errors() {
        let (animator, _) = herd(1);
        let result = RuntimeBuilder::new(test_config(10), animator, pasture(1))
            .policies(vec![NoopPolicy])
            .models(vec![Some(SceneNodeId(7))])
            .build();
        assert!(matches!(result, Err(RuntimeError::Anim(_))));
    }

    #[test]
    fn zero_think_interval_is_rejected() {
        let (animator, _) = herd(0);
        let config = RuntimeConfig { think_interval_ticks: 0, ..test_config(10) };
        let result = RuntimeBuilder::<NoopPolicy, _>::new(config, animator, GridWorld::new(1, 1)).build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[test]
    fn per_actor_start_delays() {
        let (animator, _) = herd(2);
        let runtime = RuntimeBuilder::new(test_config(10), animator, pasture(2))
            .policies(vec![NoopPolicy; 2])
            .start_delays(vec![4, 0])
            .build()
            .unwrap();
        assert_eq!(runtime.drivers[0].start_delay(), 4);
        assert_eq!(runtime.drivers[1].start_delay(), 1);
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn runs_to_end_tick_with_observer_hooks() {
        let (animator, _) = herd(2);
        let config = RuntimeConfig { snapshot_interval_ticks: 5, ..test_config(10) };
        let mut runtime = RuntimeBuilder::new(config, animator, pasture(2))
            .policies(vec![NoopPolicy; 2])
            .build()
            .unwrap();
        let mut tally = Tally::default();
        runtime.run(&mut tally).unwrap();

        assert_eq!(tally.ticks, 10);
        // start at 1, cycles at 3, 5, 7, 9 for each actor
        assert_eq!(tally.cycles, 8);
        assert_eq!(tally.snapshots, vec![Tick(0), Tick(5)]);
        assert_eq!(tally.last.len(), 2);
        assert_eq!(tally.last[1].position, Some(Cell::new(0, 1)));
        assert_eq!(tally.ended_at, Some(Tick(10)));
        assert_eq!(runtime.now(), Tick(10));
        assert!(runtime.drivers.iter().all(|d| d.run_count() == 4));
    }

    #[test]
    fn run_ticks_ignores_end_tick() {
        let (animator, _) = herd(1);
        let mut runtime = RuntimeBuilder::new(test_config(2), animator, pasture(1))
            .policies(vec![NoopPolicy])
            .build()
            .unwrap();
        runtime.run_ticks(6, &mut NoopObserver).unwrap();
        assert_eq!(runtime.now(), Tick(6));
        assert_eq!(runtime.drivers[0].run_count(), 2);
    }

    #[test]
    fn grazer_walks_then_animates() {
        let (animator, models) = herd(1);
        let policy = Grazer { walk_to: Some(Cell::new(3, 0)), ..Grazer::default() };
        let mut runtime = RuntimeBuilder::new(test_config(14), animator, pasture(1))
            .policies(vec![policy])
            .models(models)
            .build()
            .unwrap();

        // first cycle at tick 3 issues the move; 3 cells at 2 ticks each
        runtime.run_ticks(4, &mut NoopObserver).unwrap();
        assert!(runtime.world.is_moving(ActorId(0)));
        assert_eq!(runtime.world.arrival_tick(ActorId(0)), Some(Tick(9)));

        runtime.run(&mut NoopObserver).unwrap();
        let snap = &runtime.snapshot()[0];
        assert_eq!(snap.position, Some(Cell::new(3, 0)));
        assert!(!snap.moving);
        assert_eq!(snap.schedule.as_deref(), Some("graze"));
        assert_eq!(snap.clip.as_deref(), Some("graze"));
    }

    #[test]
    fn emitted_signal_interrupts_schedule() {
        let (animator, models) = herd(1);
        let selects = Rc::new(Flag::new(0));
        let policy = Grazer { selects: Rc::clone(&selects), ..Grazer::default() };
        let mut runtime = RuntimeBuilder::new(test_config(20), animator, pasture(1))
            .policies(vec![policy])
            .models(models)
            .build()
            .unwrap();

        runtime.run_ticks(6, &mut NoopObserver).unwrap();
        assert_eq!(selects.get(), 1);

        runtime.emit("startled");
        runtime.run_ticks(2, &mut NoopObserver).unwrap();
        assert_eq!(selects.get(), 2);

        runtime.run_ticks(4, &mut NoopObserver).unwrap();
        assert_eq!(selects.get(), 2, "signal is consumed by one cycle");
    }

    #[test]
    fn raise_signal_targets_one_actor() {
        let (animator, models) = herd(2);
        let first = Rc::new(Flag::new(0));
        let second = Rc::new(Flag::new(0));
        let policies = vec![
            Grazer { selects: Rc::clone(&first), ..Grazer::default() },
            Grazer { selects: Rc::clone(&second), ..Grazer::default() },
        ];
        let mut runtime = RuntimeBuilder::new(test_config(20), animator, pasture(2))
            .policies(policies)
            .models(models)
            .build()
            .unwrap();

        runtime.run_ticks(4, &mut NoopObserver).unwrap();
        runtime.raise_signal(ActorId(1), "startled").unwrap();
        runtime.run_ticks(2, &mut NoopObserver).unwrap();
        assert_eq!((first.get(), second.get()), (1, 2));
    }

    #[test]
    fn retire_stops_everything() {
        let (animator, models) = herd(1);
        let mut runtime = RuntimeBuilder::new(test_config(20), animator, pasture(1))
            .policies(vec![Grazer::default()])
            .models(models)
            .build()
            .unwrap();
        runtime.run_ticks(4, &mut NoopObserver).unwrap();
        assert_eq!(runtime.snapshot()[0].clip.as_deref(), Some("graze"));

        runtime.retire(ActorId(0)).unwrap();
        assert_eq!(runtime.bus.subscriber_count(), 0);
        assert!(runtime.timers.is_empty());
        let before = runtime.drivers[0].run_count();
        runtime.run_ticks(6, &mut NoopObserver).unwrap();
        assert_eq!(runtime.drivers[0].run_count(), before);
        assert!(!runtime.animator.is_playing(runtime.models[0].unwrap(), None));
    }

    #[test]
    fn reset_and_restart() {
        let (animator, _) = herd(1);
        let mut runtime = RuntimeBuilder::new(test_config(40), animator, pasture(1))
            .policies(vec![NoopPolicy])
            .build()
            .unwrap();
        runtime.run_ticks(4, &mut NoopObserver).unwrap();
        runtime.reset(ActorId(0)).unwrap();
        assert!(runtime.timers.is_empty());

        runtime.start(ActorId(0), 0).unwrap();
        assert_eq!(runtime.timers.next_tick(), Some(Tick(5)));
    }

    #[test]
    fn unknown_actor_is_an_error() {
        let (animator, _) = herd(0);
        let mut runtime = RuntimeBuilder::<NoopPolicy, _>::new(test_config(1), animator, GridWorld::new(1, 1))
            .build()
            .unwrap();
        let err = runtime.raise_signal(ActorId(9), "x").unwrap_err();
        assert!(matches!(err, RuntimeError::Core(NpcError::ActorNotFound(ActorId(9)))));
        assert!(runtime.driver(ActorId(0)).is_err());
    }
}

// ── GridWorld ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod world_tests {
    use super::*;

    const COW: ActorId = ActorId(0);

    fn field() -> GridWorld {
        let mut world = GridWorld::new(5, 5);
        world.place(COW, Cell::new(2, 2));
        world
    }

    #[test]
    fn passable_cells_nearest_first_within_bounds() {
        let mut world = GridWorld::new(3, 3);
        world.place(COW, Cell::new(0, 0));
        world.block(Cell::new(1, 1));
        let cells: Vec<_> = world.passable_cells(COW, 1).into_iter().map(|c| (c.cell, c.distance)).collect();
        assert_eq!(cells, vec![(Cell::new(1, 0), 1), (Cell::new(0, 1), 1)]);

        let far = world.passable_cells(COW, 2);
        assert_eq!(far.len(), 7);
        assert!(far.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn unplaced_actor_has_nothing() {
        let world = GridWorld::new(3, 3);
        assert!(world.passable_cells(ActorId(4), 3).is_empty());
        assert_eq!(world.position(ActorId(4)), None);
    }

    #[test]
    fn move_lands_after_distance_times_pace() {
        let mut world = field();
        let id = world.move_to(COW, Cell::new(4, 3), Gait::Walk, false);
        assert_eq!(world.move_status(id), MoveStatus::InProgress);
        assert_eq!(world.destination(COW), Some(Cell::new(4, 3)));

        world.advance(Tick(3));
        assert_eq!(world.position(COW), Some(Cell::new(2, 2)));
        world.advance(Tick(4));
        assert_eq!(world.position(COW), Some(Cell::new(4, 3)));
        assert_eq!(world.move_status(id), MoveStatus::Arrived);
        assert!(!world.is_moving(COW));
    }

    #[test]
    fn running_is_faster() {
        let mut world = field();
        world.move_to(COW, Cell::new(4, 2), Gait::Run, false);
        assert_eq!(world.arrival_tick(COW), Some(Tick(2)));
    }

    #[test]
    fn custom_paces_clamp_to_one_tick() {
        let mut world = GridWorld::new(5, 5).with_paces(3, 0);
        world.place(COW, Cell::new(2, 2));
        world.move_to(COW, Cell::new(4, 2), Gait::Walk, false);
        assert_eq!(world.arrival_tick(COW), Some(Tick(6)));
        world.move_to(COW, Cell::new(4, 2), Gait::Run, false);
        assert_eq!(world.arrival_tick(COW), Some(Tick(2)));
    }

    #[test]
    fn blocked_target_fails_unless_ignored() {
        let mut world = field();
        world.block(Cell::new(3, 3));
        let refused = world.move_to(COW, Cell::new(3, 3), Gait::Walk, false);
        assert_eq!(world.move_status(refused), MoveStatus::Failed);
        assert!(!world.is_moving(COW));

        let forced = world.move_to(COW, Cell::new(3, 3), Gait::Walk, true);
        assert_eq!(world.move_status(forced), MoveStatus::InProgress);

        let outside = world.move_to(COW, Cell::new(9, 9), Gait::Walk, true);
        assert_eq!(world.move_status(outside), MoveStatus::Failed);
        assert_eq!(world.move_status(forced), MoveStatus::Failed);
    }

    #[test]
    fn new_move_replaces_old_one() {
        let mut world = field();
        let first = world.move_to(COW, Cell::new(0, 0), Gait::Walk, false);
        let second = world.move_to(COW, Cell::new(4, 4), Gait::Walk, false);
        assert_eq!(world.move_status(first), MoveStatus::Failed);
        assert_eq!(world.move_status(second), MoveStatus::InProgress);
        world.stop_moving(COW);
        assert_eq!(world.move_status(second), MoveStatus::Failed);
        assert_eq!(world.position(COW), Some(Cell::new(2, 2)));
    }

    #[test]
    fn reissued_moves_keep_one_status_per_actor() {
        let mut world = field();
        world.place(ActorId(1), Cell::new(0, 0));
        for i in 0..100 {
            world.move_to(COW, Cell::new(i % 5, 4), Gait::Walk, false);
        }
        let last = world.move_to(COW, Cell::new(4, 4), Gait::Walk, false);
        world.move_to(ActorId(1), Cell::new(1, 1), Gait::Run, false);
        assert_eq!(world.tracked_moves(), 2);
        assert_eq!(world.move_status(last), MoveStatus::InProgress);

        world.advance(Tick(50));
        assert_eq!(world.move_status(last), MoveStatus::Arrived);
        assert_eq!(world.tracked_moves(), 2);

        world.move_to(COW, Cell::new(9, 9), Gait::Walk, false);
        assert_eq!(world.move_status(last), MoveStatus::Failed);
        assert_eq!(world.tracked_moves(), 1);
    }

    #[test]
    fn move_to_own_cell_arrives_at_once() {
        let mut world = field();
        let id = world.move_to(COW, Cell::new(2, 2), Gait::Walk, false);
        assert_eq!(world.move_status(id), MoveStatus::Arrived);
    }
}
