//! Fluent builder for constructing a [`Runtime`].

use npc_ai::{BehaviorDriver, BehaviorPolicy, SignalBus, TimerQueue, World};
use npc_anim::{AnimError, Animator};
use npc_core::{ActorId, ActorRng, RuntimeConfig, SceneNodeId, Tick};
use tracing::debug;

use crate::{Runtime, RuntimeError, RuntimeResult};

/// Fluent builder for [`Runtime<P, W>`].
///
/// # Required inputs
///
/// - [`RuntimeConfig`] — think interval, start delay, total ticks, seed, …
/// - [`Animator`] — scene graph, clip backend and initialised players
/// - `W: World` — positions and movement (e.g. [`GridWorld`][crate::GridWorld])
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                      |
/// |----------------------|----------------------------------------------|
/// | `.policies(v)`       | No actors                                    |
/// | `.models(v)`         | No actor has a model                         |
/// | `.start_delays(v)`   | `config.start_delay_ticks` for every actor   |
/// | `.signal_bus(b)`     | A fresh bus                                  |
/// | `.paused()`          | Drivers are started at tick 0                |
///
/// # Example
///
/// ```rust,ignore
/// let mut runtime = RuntimeBuilder::new(config, animator, world)
///     .policies(vec![AnimalPolicy::default(); n])
///     .models(models)
///     .build()?;
/// runtime.run(&mut NoopObserver)?;
/// ```
pub struct RuntimeBuilder<P: BehaviorPolicy, W: World> {
    config:       RuntimeConfig,
    animator:     Animator,
    world:        W,
    policies:     Vec<P>,
    models:       Option<Vec<Option<SceneNodeId>>>,
    start_delays: Option<Vec<u64>>,
    bus:          Option<SignalBus>,
    autostart:    bool,
}

impl<P: BehaviorPolicy, W: World> RuntimeBuilder<P, W> {
    /// Create a builder with all required inputs.
    pub fn new(config: RuntimeConfig, animator: Animator, world: W) -> Self {
        Self {
            config,
            animator,
            world,
            policies:     Vec::new(),
            models:       None,
            start_delays: None,
            bus:          None,
            autostart:    true,
        }
    }

    /// One policy per actor; actor `i` gets `policies[i]`.
    pub fn policies(mut self, policies: Vec<P>) -> Self {
        self.policies = policies;
        self
    }

    /// Root scene node of each actor's model (must be length actor count).
    pub fn models(mut self, models: Vec<Option<SceneNodeId>>) -> Self {
        self.models = Some(models);
        self
    }

    /// Per-actor start delays (must be length actor count).  Zero falls back
    /// to the driver's default of one tick.
    pub fn start_delays(mut self, delays: Vec<u64>) -> Self {
        self.start_delays = Some(delays);
        self
    }

    /// Share an existing bus instead of creating one.
    pub fn signal_bus(mut self, bus: SignalBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Leave every driver inactive; start them later with
    /// [`Runtime::start`] or [`Runtime::start_all`].
    pub fn paused(mut self) -> Self {
        self.autostart = false;
        self
    }

    /// Validate inputs, create the drivers, arm their start timers and return
    /// a ready-to-run [`Runtime`].
    pub fn build(self) -> RuntimeResult<Runtime<P, W>> {
        let actor_count = self.policies.len();

        // ── Validate and resolve optional inputs ──────────────────────────
        if self.config.think_interval_ticks == 0 {
            return Err(RuntimeError::Config("think_interval_ticks must be positive".into()));
        }

        let models = match self.models {
            Some(m) => {
                if m.len() != actor_count {
                    return Err(RuntimeError::CountMismatch {
                        expected: actor_count,
                        got:      m.len(),
                        what:     "models",
                    });
                }
                if let Some(missing) = m.iter().flatten().find(|n| !self.animator.scene().contains(**n)) {
                    return Err(AnimError::UnknownNode(*missing).into());
                }
                m
            }
            None => vec![None; actor_count],
        };

        let start_delays = match self.start_delays {
            Some(d) => {
                if d.len() != actor_count {
                    return Err(RuntimeError::CountMismatch {
                        expected: actor_count,
                        got:      d.len(),
                        what:     "start delays",
                    });
                }
                d
            }
            None => vec![self.config.start_delay_ticks; actor_count],
        };

        let bus = self.bus.unwrap_or_default();

        // ── Drivers, RNGs and start timers ────────────────────────────────
        let mut timers = TimerQueue::new();
        let mut drivers = Vec::with_capacity(actor_count);
        let mut rngs = Vec::with_capacity(actor_count);
        for (i, (policy, delay)) in self.policies.into_iter().zip(start_delays).enumerate() {
            let actor = ActorId(i as u32);
            let mut driver = BehaviorDriver::new(actor, policy);
            driver.attach_signals(&bus);
            if self.autostart {
                driver.run(&mut timers, Tick::ZERO, self.config.think_interval_ticks, delay);
            }
            drivers.push(driver);
            rngs.push(ActorRng::new(self.config.seed, actor));
        }
        debug!(actors = actor_count, seed = self.config.seed, "runtime built");

        Ok(Runtime {
            clock:    self.config.make_clock(),
            config:   self.config,
            timers,
            animator: self.animator,
            world:    self.world,
            drivers,
            models,
            rngs,
            bus,
        })
    }
}
