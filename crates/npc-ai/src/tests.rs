//! Unit tests for npc-ai.

use std::cell::{Cell as Flag, RefCell};
use std::rc::Rc;

use npc_anim::{AnimationMeta, Animator, AnimatorConfig, Repeat, SceneGraph, TimelineBackend};
use npc_core::{ActorId, ActorRng, Cell, MoveId, SceneNodeId, Tick};

use crate::{
    BehaviorDriver, BehaviorPolicy, CellCandidate, ConditionContext, Env, Gait, GoToPositionTask,
    MoveStatus, NoopPolicy, NoopTask, PlayAnimationTask, Schedule, SignalBus, Subscription, Task,
    TimerKind, TimerQueue, Value, World,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const ACTOR: ActorId = ActorId(0);

type Log = Rc<RefCell<Vec<String>>>;

/// World with one actor whose moves finish only when the test says so.
#[derive(Default)]
struct ScriptedWorld {
    moving:      bool,
    destination: Option<Cell>,
    moves:       Vec<(Cell, MoveStatus)>,
}

impl ScriptedWorld {
    fn finish_move(&mut self) {
        if let Some(last) = self.moves.last_mut() {
            last.1 = MoveStatus::Arrived;
        }
        self.moving = false;
        self.destination = None;
    }
}

impl World for ScriptedWorld {
    fn position(&self, _actor: ActorId) -> Option<Cell> {
        Some(Cell::new(0, 0))
    }

    fn passable_cells(&self, _actor: ActorId, _radius: u32) -> Vec<CellCandidate> {
        vec![CellCandidate { cell: Cell::new(1, 0), distance: 1 }]
    }

    fn is_moving(&self, _actor: ActorId) -> bool {
        self.moving
    }

    fn destination(&self, _actor: ActorId) -> Option<Cell> {
        self.destination
    }

    fn move_to(&mut self, _actor: ActorId, target: Cell, _gait: Gait, _ignore: bool) -> MoveId {
        if let Some(last) = self.moves.last_mut() {
            if last.1 == MoveStatus::InProgress {
                last.1 = MoveStatus::Failed;
            }
        }
        self.moves.push((target, MoveStatus::InProgress));
        self.moving = true;
        self.destination = Some(target);
        MoveId(self.moves.len() as u64 - 1)
    }

    fn move_status(&self, id: MoveId) -> MoveStatus {
        self.moves.get(id.index()).map_or(MoveStatus::Failed, |m| m.1)
    }

    fn stop_moving(&mut self, _actor: ActorId) {
        self.moving = false;
        self.destination = None;
    }
}

/// Everything an `Env` borrows, owned in one place.
struct Stage {
    animator: Animator,
    world:    ScriptedWorld,
    rng:      ActorRng,
    model:    SceneNodeId,
    now:      Tick,
}

impl Stage {
    fn new() -> Self {
        let mut scene = SceneGraph::new();
        let model = scene.add_root("cow");
        let backend = TimelineBackend::new()
            .with_clip(model, "graze", 3)
            .with_clip(model, "graze_look", 3)
            .with_clip(model, "sleep_idle", 3);
        let mut animator = Animator::new(AnimatorConfig::default(), scene, backend);
        animator
            .init(
                model,
                [
                    AnimationMeta::new("graze"),
                    AnimationMeta::new("sleep_idle").with_repeat(Repeat::Forever),
                ]
                .into_iter()
                .collect(),
            )
            .unwrap();
        Self {
            animator,
            world: ScriptedWorld::default(),
            rng: ActorRng::new(1, ACTOR),
            model,
            now: Tick::ZERO,
        }
    }

    fn env(&mut self) -> Env<'_> {
        Env::new(self.now, ACTOR, Some(self.model), &mut self.animator, &mut self.world, &mut self.rng)
    }

    /// Fire every due timer up to and including `until`, one tick at a time.
    /// Returns the number of evaluation cycles that ran.
    fn pump<P: BehaviorPolicy>(
        &mut self,
        driver: &mut BehaviorDriver<P>,
        timers: &mut TimerQueue,
        until:  Tick,
    ) -> usize {
        let mut cycles = 0;
        while self.now <= until {
            for fired in timers.drain_due(self.now) {
                if driver.on_timer(timers, fired, &mut self.env()) {
                    cycles += 1;
                }
            }
            self.now = self.now + 1;
        }
        self.now = until;
        cycles
    }
}

/// Task that logs each poll and finishes after `polls` polls.
struct Counting {
    polls: u32,
    seen:  Rc<Flag<u32>>,
    log:   Option<Log>,
}

impl Counting {
    fn new(polls: u32) -> (Self, Rc<Flag<u32>>) {
        let seen = Rc::new(Flag::new(0));
        (Self { polls, seen: Rc::clone(&seen), log: None }, seen)
    }

    fn forever(log: &Log) -> Self {
        Self { polls: u32::MAX, seen: Rc::default(), log: Some(Rc::clone(log)) }
    }
}

impl Task for Counting {
    fn execute(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) -> bool {
        self.seen.set(self.seen.get() + 1);
        if let Some(log) = &self.log {
            log.borrow_mut().push("task".into());
        }
        self.seen.get() >= self.polls
    }
}

type Gather = Box<dyn FnMut(&mut ConditionContext)>;
type Select = Box<dyn FnMut(&ConditionContext) -> Option<Schedule>>;

/// Policy whose hooks are logged and scripted by the test.
#[derive(Default)]
struct Scripted {
    log:       Log,
    on_gather: Option<Gather>,
    on_select: Option<Select>,
    listen:    Vec<String>,
    cleaned:   Rc<Flag<bool>>,
}

impl BehaviorPolicy for Scripted {
    fn select_new_schedule(&mut self, ctx: &mut ConditionContext, _env: &mut Env<'_>) -> Option<Schedule> {
        self.log.borrow_mut().push("select".into());
        self.on_select.as_mut().and_then(|f| f(ctx))
    }

    fn gather_conditions(&mut self, ctx: &mut ConditionContext, _env: &mut Env<'_>) {
        self.log.borrow_mut().push("gather".into());
        if let Some(f) = self.on_gather.as_mut() {
            f(ctx);
        }
    }

    fn pre_think(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) {
        self.log.borrow_mut().push("pre".into());
    }

    fn post_think(&mut self, _ctx: &mut ConditionContext, _env: &mut Env<'_>) {
        self.log.borrow_mut().push("post".into());
    }

    fn subscribe(&mut self, bus: &SignalBus) -> Vec<Subscription> {
        if self.listen.is_empty() {
            Vec::new()
        } else {
            vec![bus.subscribe(self.listen.clone())]
        }
    }

    fn clean_up(&mut self) {
        self.cleaned.set(true);
    }
}

fn drain(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

// ── ConditionContext ──────────────────────────────────────────────────────────

#[cfg(test)]
mod context {
    use super::*;

    #[test]
    fn next_cycle_moves_global_and_promotes_signals() {
        let mut ctx = ConditionContext::new(ACTOR);
        ctx.global.insert("visits".into(), Value::from(3i64));
        ctx.local.insert("scratch".into(), Value::from(true));
        ctx.add_condition("old");
        ctx.raise_signal("poked");
        ctx.raise_signal("dragged");
        ctx.raise_signal("poked");

        let next = ctx.next_cycle();
        assert_eq!(next.conditions(), ["poked", "dragged"]);
        assert!(next.signals().is_empty());
        assert_eq!(next.global.get("visits").and_then(Value::as_int), Some(3));
        assert!(next.local.is_empty());
        assert!(ctx.global.is_empty());
        assert_eq!(next.actor(), ACTOR);
    }

    #[test]
    fn conditions_are_an_ordered_set() {
        let mut ctx = ConditionContext::new(ACTOR);
        ctx.add_condition("a");
        ctx.add_condition("b");
        ctx.add_condition("a");
        assert_eq!(ctx.conditions(), ["a", "b"]);
        assert!(ctx.has_condition("b"));
        assert!(!ctx.has_condition("c"));
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::from("x").as_text(), Some("x"));
        assert_eq!(Value::from(2i64).as_float(), Some(2.0));
        assert_eq!(Value::from(true).as_int(), None);
    }
}

// ── SignalBus ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod signals {
    use super::*;

    #[test]
    fn subscriptions_filter_by_name() {
        let bus = SignalBus::new();
        let drag = bus.subscribe(["dragged"]);
        let all = bus.subscribe(Vec::<String>::new());

        bus.emit("dragged");
        bus.emit("fed");

        assert_eq!(drag.drain(), vec!["dragged"]);
        assert_eq!(all.drain(), vec!["dragged", "fed"]);
        assert_eq!(drag.pending(), 0);
    }

    #[test]
    fn dropping_unsubscribes() {
        let bus = SignalBus::new();
        let sub = bus.subscribe(["dragged"]);
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit("dragged");
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let sub = {
            let bus = SignalBus::new();
            bus.subscribe(["x"])
        };
        assert!(sub.drain().is_empty());
    }
}

// ── TimerQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod timers {
    use super::*;

    #[test]
    fn drains_everything_due_in_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(Tick(5), ACTOR, TimerKind::Interval);
        let early = q.schedule(Tick(2), ActorId(1), TimerKind::Start);
        let also_early = q.schedule(Tick(2), ActorId(2), TimerKind::Start);

        let due: Vec<_> = q.drain_due(Tick(3)).into_iter().map(|e| e.id).collect();
        assert_eq!(due, vec![early, also_early]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_tick(), Some(Tick(5)));
        assert!(q.is_pending(late));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut q = TimerQueue::new();
        let id = q.schedule(Tick(1), ACTOR, TimerKind::Start);
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert_eq!(q.next_tick(), None);
        assert!(q.drain_due(Tick(10)).is_empty());
        assert!(q.is_empty());
    }
}

// ── Schedule ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod schedule {
    use super::*;

    #[test]
    fn positive_interrupt_completes_regardless_of_tasks() {
        let (task, _) = Counting::new(5);
        let schedule = Schedule::new("idle").then(task).interrupted_by(["stateChanged"]);
        let mut ctx = ConditionContext::new(ACTOR);
        assert!(!schedule.is_completed(&ctx));
        ctx.add_condition("stateChanged");
        assert!(schedule.is_completed(&ctx));
        assert_eq!(schedule.interrupt_cause(&ctx), Some("stateChanged"));
    }

    #[test]
    fn negative_interrupt_completes_when_absent() {
        let (task, _) = Counting::new(5);
        let schedule = Schedule::new("drag").then(task).while_present(["inDrag"]);
        let mut ctx = ConditionContext::new(ACTOR);
        assert!(schedule.is_completed(&ctx));
        ctx.add_condition("inDrag");
        assert!(!schedule.is_completed(&ctx));
    }

    #[test]
    fn interrupt_completes_unfinished_schedule() {
        let mut stage = Stage::new();
        let (first, _) = Counting::new(2);
        let (second, _) = Counting::new(2);
        let mut schedule = Schedule::new("two").then(first).then(second);
        schedule.add_interrupts(["stateChanged"], false);

        let mut ctx = ConditionContext::new(ACTOR);
        ctx.add_condition("stateChanged");
        assert!(!schedule.execute(&mut ctx, &mut stage.env()));
        assert_eq!(schedule.finished_count(), 0);
        assert!(schedule.is_completed(&ctx));
    }

    #[test]
    fn at_most_one_task_finishes_per_execute() {
        let mut stage = Stage::new();
        let mut schedule = Schedule::new("three");
        schedule.add_tasks([
            Box::new(NoopTask) as Box<dyn Task>,
            Box::new(NoopTask),
            Box::new(NoopTask),
        ]);
        let mut ctx = ConditionContext::new(ACTOR);

        assert!(!schedule.execute(&mut ctx, &mut stage.env()));
        assert_eq!(schedule.finished_count(), 1);
        assert!(!schedule.execute(&mut ctx, &mut stage.env()));
        assert!(schedule.execute(&mut ctx, &mut stage.env()));
        assert_eq!(schedule.finished_count(), 3);
        assert!(schedule.is_completed(&ctx));
    }

    #[test]
    fn unfinished_task_is_resumed_not_restarted() {
        let mut stage = Stage::new();
        let (slow, polls) = Counting::new(3);
        let (after, after_polls) = Counting::new(1);
        let mut schedule = Schedule::new("slow").then(slow).then(after);
        let mut ctx = ConditionContext::new(ACTOR);

        for _ in 0..3 {
            schedule.execute(&mut ctx, &mut stage.env());
        }
        assert_eq!(polls.get(), 3);
        assert_eq!(after_polls.get(), 0);
        assert!(schedule.execute(&mut ctx, &mut stage.env()));
        assert_eq!(polls.get(), 3, "finished task is not polled again");
        assert_eq!(after_polls.get(), 1);
    }

    #[test]
    fn empty_schedule_finishes_on_first_execute() {
        let mut stage = Stage::new();
        let mut schedule = Schedule::new("empty");
        let mut ctx = ConditionContext::new(ACTOR);
        assert!(!schedule.is_completed(&ctx));
        assert!(schedule.execute(&mut ctx, &mut stage.env()));
        assert!(schedule.is_completed(&ctx));
        assert!(schedule.is_empty());
    }

    #[test]
    fn schedule_ids_are_unique() {
        assert_ne!(Schedule::new("a").id(), Schedule::new("a").id());
    }
}

// ── BehaviorDriver ────────────────────────────────────────────────────────────

#[cfg(test)]
mod driver {
    use super::*;

    #[test]
    fn cycle_runs_hooks_in_fixed_order() {
        let mut stage = Stage::new();
        let log = Log::default();
        let task_log = Rc::clone(&log);
        let policy = Scripted {
            log: Rc::clone(&log),
            on_select: Some(Box::new(move |_| Some(Schedule::new("busy").then(Counting::forever(&task_log))))),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);

        driver.execute(&mut stage.env());
        assert_eq!(drain(&log), ["gather", "select", "pre", "task", "post"]);
        driver.execute(&mut stage.env());
        assert_eq!(drain(&log), ["gather", "pre", "task", "post"]);
        assert_eq!(driver.run_count(), 2);
    }

    #[test]
    fn interrupt_triggers_reselection() {
        let mut stage = Stage::new();
        let log = Log::default();
        let task_log = Log::default();
        let policy = Scripted {
            log: Rc::clone(&log),
            on_select: Some(Box::new(move |_| {
                Some(Schedule::new("idle").then(Counting::forever(&task_log)).interrupted_by(["poked"]))
            })),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);

        driver.execute(&mut stage.env());
        let first = driver.current_schedule().unwrap().id();
        driver.execute(&mut stage.env());
        assert_eq!(driver.current_schedule().unwrap().id(), first);

        driver.raise_signal("poked");
        driver.execute(&mut stage.env());
        assert_ne!(driver.current_schedule().unwrap().id(), first);
        assert_eq!(log.borrow().iter().filter(|h| *h == "select").count(), 2);
    }

    #[test]
    fn raised_signal_is_seen_exactly_once() {
        let mut stage = Stage::new();
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::default();
        let seen_hook = Rc::clone(&seen);
        let policy = Scripted {
            on_gather: Some(Box::new(move |ctx| seen_hook.borrow_mut().push(ctx.conditions().to_vec()))),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);

        driver.raise_signal("poked");
        driver.raise_signal("poked");
        driver.execute(&mut stage.env());
        driver.execute(&mut stage.env());

        assert_eq!(*seen.borrow(), vec![vec!["poked".to_string()], vec![]]);
    }

    #[test]
    fn global_survives_cycles_local_does_not() {
        let mut stage = Stage::new();
        let observed: Rc<RefCell<Vec<(Option<i64>, bool)>>> = Rc::default();
        let observed_hook = Rc::clone(&observed);
        let policy = Scripted {
            on_gather: Some(Box::new(move |ctx| {
                let visits = ctx.global.get("visits").and_then(Value::as_int);
                observed_hook.borrow_mut().push((visits, ctx.local.contains_key("scratch")));
                ctx.global.insert("visits".into(), Value::Int(visits.unwrap_or(0) + 1));
                ctx.local.insert("scratch".into(), Value::Bool(true));
            })),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);

        for _ in 0..3 {
            driver.execute(&mut stage.env());
        }
        assert_eq!(*observed.borrow(), vec![(None, false), (Some(1), false), (Some(2), false)]);
        assert_eq!(driver.global().get("visits"), Some(&Value::Int(3)));
    }

    #[test]
    fn bus_signals_fold_into_next_cycle() {
        let mut stage = Stage::new();
        let bus = SignalBus::new();
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::default();
        let seen_hook = Rc::clone(&seen);
        let policy = Scripted {
            listen: vec!["dragged".into()],
            on_gather: Some(Box::new(move |ctx| seen_hook.borrow_mut().push(ctx.conditions().to_vec()))),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);
        driver.attach_signals(&bus);

        bus.emit("dragged");
        bus.emit("dragged");
        bus.emit("ignored");
        driver.execute(&mut stage.env());
        driver.execute(&mut stage.env());

        assert_eq!(*seen.borrow(), vec![vec!["dragged".to_string()], vec![]]);
    }

    #[test]
    fn clean_up_unsubscribes_and_notifies_policy() {
        let mut stage = Stage::new();
        let mut timers = TimerQueue::new();
        let bus = SignalBus::new();
        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::default();
        let seen_hook = Rc::clone(&seen);
        let cleaned = Rc::new(Flag::new(false));
        let policy = Scripted {
            listen: vec!["dragged".into()],
            on_gather: Some(Box::new(move |ctx| seen_hook.borrow_mut().push(ctx.conditions().to_vec()))),
            cleaned: Rc::clone(&cleaned),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);
        driver.attach_signals(&bus);
        driver.run(&mut timers, Tick::ZERO, 2, 1);

        driver.clean_up(&mut timers);
        assert!(cleaned.get());
        assert!(!driver.is_active());
        assert!(timers.is_empty());
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(driver.subscription_count(), 0);

        bus.emit("dragged");
        driver.execute(&mut stage.env());
        assert_eq!(*seen.borrow(), vec![Vec::<String>::new()]);
    }

    #[test]
    fn run_twice_leaves_one_evaluation_loop() {
        let mut stage = Stage::new();
        let mut timers = TimerQueue::new();
        let mut driver = BehaviorDriver::new(ACTOR, NoopPolicy);

        driver.run(&mut timers, Tick::ZERO, 2, 1);
        driver.run(&mut timers, Tick::ZERO, 2, 1);
        assert_eq!(timers.len(), 1);
        assert!(driver.is_active());

        // start at T1, cycles at T3, T5, T7, T9
        let cycles = stage.pump(&mut driver, &mut timers, Tick(10));
        assert_eq!(cycles, 4);
        assert_eq!(timers.len(), 1);

        driver.run(&mut timers, Tick(10), 2, 1);
        assert_eq!(timers.len(), 1, "re-run cancels the interval timer");
    }

    #[test]
    fn start_delay_is_remembered() {
        let mut timers = TimerQueue::new();
        let mut driver = BehaviorDriver::new(ACTOR, NoopPolicy);
        driver.run(&mut timers, Tick::ZERO, 2, 0);
        assert_eq!(driver.start_delay(), 1);

        driver.run(&mut timers, Tick::ZERO, 2, 18);
        driver.reset(&mut timers);
        driver.run(&mut timers, Tick::ZERO, 2, 0);
        assert_eq!(driver.start_delay(), 18);
        assert_eq!(timers.next_tick(), Some(Tick(18)));
    }

    #[test]
    fn reset_stops_the_loop_and_drops_schedule() {
        let mut stage = Stage::new();
        let mut timers = TimerQueue::new();
        let policy = Scripted {
            on_select: Some(Box::new(|_| Some(Schedule::new("idle").then(NoopTask)))),
            ..Scripted::default()
        };
        let mut driver = BehaviorDriver::new(ACTOR, policy);
        driver.run(&mut timers, Tick::ZERO, 1, 1);
        assert_eq!(stage.pump(&mut driver, &mut timers, Tick(3)), 2);
        assert!(driver.current_schedule().is_some());

        driver.reset(&mut timers);
        assert!(driver.current_schedule().is_none());
        assert!(!driver.is_active());
        assert_eq!(stage.pump(&mut driver, &mut timers, Tick(10)), 0);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut stage = Stage::new();
        let mut timers = TimerQueue::new();
        let mut driver = BehaviorDriver::new(ACTOR, NoopPolicy);
        let foreign = timers.schedule(Tick(0), ACTOR, TimerKind::Interval);
        let fired = timers.drain_due(Tick(0));
        assert_eq!(fired[0].id, foreign);
        assert!(!driver.on_timer(&mut timers, fired[0], &mut stage.env()));
        assert_eq!(driver.run_count(), 0);
    }
}

// ── Stock tasks ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tasks {
    use super::*;

    fn poll(task: &mut impl Task, stage: &mut Stage) -> bool {
        let mut ctx = ConditionContext::new(ACTOR);
        task.execute(&mut ctx, &mut stage.env())
    }

    #[test]
    fn play_animation_finishes_on_callback() {
        let mut stage = Stage::new();
        let mut task = PlayAnimationTask::new("graze").with_repeat(Repeat::Times(1));

        assert!(!poll(&mut task, &mut stage));
        assert_eq!(stage.animator.current_clip(stage.model), Some("graze"));
        assert!(!poll(&mut task, &mut stage));

        stage.animator.advance(3);
        assert!(poll(&mut task, &mut stage));
    }

    #[test]
    fn play_animation_waits_for_movement_to_end() {
        let mut stage = Stage::new();
        stage.world.moving = true;
        let mut task = PlayAnimationTask::new("graze");

        assert!(!poll(&mut task, &mut stage));
        assert_eq!(stage.animator.current_clip(stage.model), None);

        stage.world.moving = false;
        assert!(!poll(&mut task, &mut stage));
        assert_eq!(stage.animator.current_clip(stage.model), Some("graze"));
    }

    #[test]
    fn play_animation_respects_no_interrupt() {
        let mut stage = Stage::new();
        stage.animator.loop_clip(stage.model, "sleep_idle").unwrap();
        let mut task = PlayAnimationTask::new("graze").no_interrupt("sleep");

        assert!(!poll(&mut task, &mut stage));
        assert_eq!(stage.animator.current_clip(stage.model), Some("sleep_idle"));
        assert!(poll(&mut task, &mut stage), "protected clip is not ours to wait for");
        assert_eq!(stage.animator.current_clip(stage.model), Some("sleep_idle"));
    }

    #[test]
    fn protected_looping_clip_does_not_stall_schedule() {
        let mut stage = Stage::new();
        stage.animator.loop_clip(stage.model, "sleep_idle").unwrap();
        let mut schedule = Schedule::new("nap")
            .then(PlayAnimationTask::new("graze").no_interrupt("sleep"))
            .then(NoopTask);
        let mut ctx = ConditionContext::new(ACTOR);

        let mut done = false;
        for tick in 1..=10 {
            stage.animator.advance(1);
            stage.now = Tick(tick);
            done = schedule.execute(&mut ctx, &mut stage.env());
            if done {
                break;
            }
        }
        assert!(done);
        assert!(stage.animator.is_playing(stage.model, Some("sleep_idle")));
    }

    #[test]
    fn play_animation_with_duration_ignores_callback() {
        let mut stage = Stage::new();
        let mut task = PlayAnimationTask::new("graze").with_duration(5);

        assert!(!poll(&mut task, &mut stage));
        stage.animator.advance(3);
        stage.now = Tick(4);
        assert!(!poll(&mut task, &mut stage));
        stage.now = Tick(5);
        assert!(poll(&mut task, &mut stage));
    }

    #[test]
    fn play_animation_without_match_finishes() {
        let mut stage = Stage::new();
        let mut task = PlayAnimationTask::new("gallop");
        assert!(!poll(&mut task, &mut stage));
        assert!(poll(&mut task, &mut stage));
    }

    #[test]
    fn go_to_issues_move_once_and_finishes_on_arrival() {
        let mut stage = Stage::new();
        let target = Cell::new(4, 2);
        let mut task = GoToPositionTask::new(target).running(true);

        assert!(!poll(&mut task, &mut stage));
        assert!(!poll(&mut task, &mut stage));
        assert_eq!(stage.world.moves.len(), 1);

        stage.world.finish_move();
        assert!(poll(&mut task, &mut stage));
        assert!(poll(&mut task, &mut stage));
        assert_eq!(stage.world.moves.len(), 1);
    }

    #[test]
    fn go_to_reissues_when_heading_elsewhere() {
        let mut stage = Stage::new();
        let mut task = GoToPositionTask::new(Cell::new(4, 2));
        assert!(!poll(&mut task, &mut stage));

        stage.world.destination = Some(Cell::new(9, 9));
        stage.world.moves[0].1 = MoveStatus::InProgress;
        assert!(!poll(&mut task, &mut stage));
        assert_eq!(stage.world.moves.len(), 2);
        assert_eq!(stage.world.moves[1].0, Cell::new(4, 2));
    }

    #[test]
    fn go_to_finishes_when_move_fails() {
        let mut stage = Stage::new();
        let mut task = GoToPositionTask::new(Cell::new(4, 2));
        assert!(!poll(&mut task, &mut stage));
        stage.world.moves[0].1 = MoveStatus::Failed;
        assert!(poll(&mut task, &mut stage));
    }
}
