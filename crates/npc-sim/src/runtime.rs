//! The `Runtime` struct and its tick loop.

use npc_ai::{BehaviorDriver, BehaviorPolicy, Env, SignalBus, TimerQueue, World};
use npc_anim::Animator;
use npc_core::{ActorId, ActorRng, Clock, NpcError, RuntimeConfig, SceneNodeId, Tick};
use tracing::{debug, trace, warn};

use crate::{ActorSnapshot, RuntimeObserver, RuntimeResult};

// ── Runtime ───────────────────────────────────────────────────────────────────

/// The main runner.
///
/// `Runtime<P, W>` holds every actor's driver plus the shared collaborators
/// and drives the three-phase tick loop described in the crate docs.  Actor
/// `i` owns `drivers[i]`, `models[i]` and `rngs[i]`.
///
/// Create via [`RuntimeBuilder`][crate::RuntimeBuilder].
pub struct Runtime<P: BehaviorPolicy, W: World> {
    /// Global configuration (think interval, total ticks, seed, …).
    pub config: RuntimeConfig,

    /// Tracks the current tick and maps it to wall time.
    pub clock: Clock,

    /// Start-delay and interval timers of every driver.
    pub timers: TimerQueue,

    /// Animation engine shared by every actor's model.
    pub animator: Animator,

    /// Positions and movement.
    pub world: W,

    /// One behavior driver per actor, indexed by `ActorId`.
    pub drivers: Vec<BehaviorDriver<P>>,

    /// Root scene node of each actor's model, if it has one.
    pub models: Vec<Option<SceneNodeId>>,

    /// Per-actor deterministic RNGs, separated for the split-borrow pattern.
    pub rngs: Vec<ActorRng>,

    /// Bus the drivers' policies subscribed to at build time.
    pub bus: SignalBus,
}

impl<P: BehaviorPolicy, W: World> Runtime<P, W> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: RuntimeObserver>(&mut self, observer: &mut O) -> RuntimeResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer);
        }
        observer.on_run_end(self.clock.current_tick);
        debug!(tick = %self.clock.current_tick, "run finished");
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: RuntimeObserver>(&mut self, n: u64, observer: &mut O) -> RuntimeResult<()> {
        for _ in 0..n {
            self.step(observer);
        }
        Ok(())
    }

    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn actor_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn driver(&self, actor: ActorId) -> RuntimeResult<&BehaviorDriver<P>> {
        Ok(self.drivers.get(actor.index()).ok_or(NpcError::ActorNotFound(actor))?)
    }

    pub fn driver_mut(&mut self, actor: ActorId) -> RuntimeResult<&mut BehaviorDriver<P>> {
        Ok(self.drivers.get_mut(actor.index()).ok_or(NpcError::ActorNotFound(actor))?)
    }

    pub fn model(&self, actor: ActorId) -> Option<SceneNodeId> {
        self.models.get(actor.index()).copied().flatten()
    }

    /// Broadcast `name` on the shared bus.  Subscribed drivers see it as a
    /// condition in their next evaluation cycle.
    pub fn emit(&self, name: &str) {
        self.bus.emit(name);
    }

    /// Raise `name` for one actor's next evaluation cycle.
    pub fn raise_signal(&mut self, actor: ActorId, name: &str) -> RuntimeResult<()> {
        self.driver_mut(actor)?.raise_signal(name);
        Ok(())
    }

    /// (Re)start `actor`'s evaluation loop at the configured interval.  A zero
    /// `start_delay` reuses the driver's previous delay.
    pub fn start(&mut self, actor: ActorId, start_delay: u64) -> RuntimeResult<()> {
        let now = self.clock.current_tick;
        let interval = self.config.think_interval_ticks;
        let driver = self
            .drivers
            .get_mut(actor.index())
            .ok_or(NpcError::ActorNotFound(actor))?;
        driver.run(&mut self.timers, now, interval, start_delay);
        Ok(())
    }

    /// Start every inactive driver with the configured default delay.
    pub fn start_all(&mut self) {
        let now = self.clock.current_tick;
        for driver in self.drivers.iter_mut().filter(|d| !d.is_active()) {
            driver.run(&mut self.timers, now, self.config.think_interval_ticks, self.config.start_delay_ticks);
        }
    }

    /// Stop `actor`'s evaluation loop and drop its schedule.
    pub fn reset(&mut self, actor: ActorId) -> RuntimeResult<()> {
        let driver = self
            .drivers
            .get_mut(actor.index())
            .ok_or(NpcError::ActorNotFound(actor))?;
        driver.reset(&mut self.timers);
        Ok(())
    }

    /// Take `actor` out of play: clean up its driver, halt its movement and
    /// stop its model's animations.
    pub fn retire(&mut self, actor: ActorId) -> RuntimeResult<()> {
        let driver = self
            .drivers
            .get_mut(actor.index())
            .ok_or(NpcError::ActorNotFound(actor))?;
        driver.clean_up(&mut self.timers);
        self.world.stop_moving(actor);
        if let Some(model) = self.model(actor) {
            self.animator.stop(model)?;
        }
        debug!(%actor, "actor retired");
        Ok(())
    }

    /// Read-only view of every actor.
    pub fn snapshot(&self) -> Vec<ActorSnapshot> {
        self.drivers
            .iter()
            .map(|driver| {
                let actor = driver.actor();
                ActorSnapshot {
                    actor,
                    schedule:  driver.current_schedule().map(|s| s.label().to_owned()),
                    clip:      self
                        .model(actor)
                        .and_then(|m| self.animator.current_clip(m))
                        .map(str::to_owned),
                    position:  self.world.position(actor),
                    moving:    self.world.is_moving(actor),
                    run_count: driver.run_count(),
                }
            })
            .collect()
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn step<O: RuntimeObserver>(&mut self, observer: &mut O) {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let cycles = self.process_tick(now);
        observer.on_tick_end(now, cycles);
        if self.config.snapshot_interval_ticks > 0
            && now.0 % self.config.snapshot_interval_ticks == 0
        {
            observer.on_snapshot(now, &self.snapshot());
        }
        self.clock.advance();
    }

    /// Returns the number of evaluation cycles that ran.
    fn process_tick(&mut self, now: Tick) -> usize {
        // ── Phase 1: movement ─────────────────────────────────────────────
        self.world.advance(now);

        // ── Phase 2: animation ────────────────────────────────────────────
        //
        // Completion callbacks run here, so tasks polled in phase 3 already
        // see this tick's finished animations.
        self.animator.advance(1);

        // ── Phase 3: timers ───────────────────────────────────────────────
        //
        // Timers armed while routing (interval re-arms) land in a later
        // tick, so the drained batch is complete.
        let mut cycles = 0;
        for fired in self.timers.drain_due(now) {
            let i = fired.actor.index();
            let (Some(driver), Some(rng)) = (self.drivers.get_mut(i), self.rngs.get_mut(i)) else {
                warn!(actor = %fired.actor, timer = %fired.id, "timer for unknown actor");
                continue;
            };
            let model = self.models.get(i).copied().flatten();
            let mut env = Env::new(now, fired.actor, model, &mut self.animator, &mut self.world, rng);
            if driver.on_timer(&mut self.timers, fired, &mut env) {
                cycles += 1;
            }
        }

        if cycles > 0 {
            trace!(tick = %now, cycles, "tick processed");
        }
        cycles
    }
}
