//! pasture — a handful of farm animals on a small grid.
//!
//! Each animal has a two-part model (body + tail) animated by the shared
//! `Animator`, moves on a `GridWorld`, and is driven by an `AnimalPolicy`.
//! A scripted event timeline toggles work, drags animals around, bumps them
//! and marks products as ready so every schedule gets exercised.
//!
//! Set `RUST_LOG=debug` to watch schedule selection and interrupts.

mod animal;

use std::io::Cursor;
use std::time::Instant;

use anyhow::Result;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use npc_anim::{Animator, AnimatorConfig, SceneGraph, TimelineBackend, load_library_json_reader};
use npc_core::{ActorId, Cell, RuntimeConfig, SceneNodeId, Tick};
use npc_sim::{ActorSnapshot, GridWorld, RuntimeBuilder, RuntimeObserver};

use animal::{
    AnimalPolicy, COLLIDED, DRAG_END, DRAG_START, PRODUCT_READY, SOMETHING_DRAGGED, STATE_CHANGED,
};

// ── Constants ─────────────────────────────────────────────────────────────────

const ANIMAL_COUNT:       usize = 4;
const SEED:               u64   = 7;
const TICK_DURATION_MS:   u32   = 100;
const TOTAL_TICKS:        u64   = 400;
const SNAPSHOT_INTERVAL:  u64   = 100;
const GRID_SIZE:          i32   = 12;

// ── Clip library ──────────────────────────────────────────────────────────────

const LIBRARY_JSON: &str = r#"{
  "idle":        { "repeat": 1, "chance": 1.0 },
  "idle_look":   { "repeat": 1, "chance": 0.4, "speed": 0.8 },
  "eat":         { "repeat": 1, "sound": { "name": "munch", "chance": 0.5, "volume": 0.6 } },
  "jump":        { "repeat": 1 },
  "drag_start":  { "next": "drag_idle" },
  "drag_idle":   { "repeat": -1 },
  "drag_finish": { "reset": true },
  "sleep_start": { "next": "sleep_idle" },
  "sleep_idle":  { "repeat": -1, "pingPong": true }
}"#;

/// Clip lengths in ticks, shared by every body and tail.
const CLIP_TICKS: &[(&str, u64)] = &[
    ("idle",        6),
    ("idle_look",   6),
    ("eat",         8),
    ("jump",        4),
    ("drag_start",  3),
    ("drag_idle",   5),
    ("drag_finish", 3),
    ("sleep_start", 6),
    ("sleep_idle",  10),
];

// ── Event timeline ────────────────────────────────────────────────────────────

/// `(tick, target, signal)`; `None` broadcasts on the shared bus.
const EVENTS: &[(u64, Option<u32>, &str)] = &[
    (40,  Some(1), STATE_CHANGED),
    (60,  Some(0), DRAG_START),
    (61,  None,    SOMETHING_DRAGGED),
    (90,  Some(0), DRAG_END),
    (120, Some(2), COLLIDED),
    (150, Some(3), PRODUCT_READY),
    (200, Some(2), STATE_CHANGED),
    (260, Some(1), DRAG_START),
    (300, Some(1), DRAG_END),
];

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct PastureLog {
    cycles:    usize,
    snapshots: usize,
}

impl RuntimeObserver for PastureLog {
    fn on_tick_end(&mut self, _tick: Tick, cycles: usize) {
        self.cycles += cycles;
    }

    fn on_snapshot(&mut self, tick: Tick, actors: &[ActorSnapshot]) {
        self.snapshots += 1;
        for a in actors {
            info!(
                %tick,
                actor    = %a.actor,
                schedule = a.schedule.as_deref().unwrap_or("-"),
                clip     = a.clip.as_deref().unwrap_or("-"),
                position = ?a.position,
                moving   = a.moving,
                "snapshot"
            );
        }
    }

    fn on_run_end(&mut self, final_tick: Tick) {
        info!(%final_tick, cycles = self.cycles, "pasture run finished");
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== pasture — npc behavior demo ===");
    println!("Animals: {ANIMAL_COUNT}  |  Ticks: {TOTAL_TICKS}  |  Seed: {SEED}");
    println!();

    // 1. Clip library.
    let library = load_library_json_reader(Cursor::new(LIBRARY_JSON))?;
    println!("Loaded {} clip descriptors", library.len());

    // 2. Scene: one body per animal with a tail underneath.
    let mut scene = SceneGraph::new();
    let mut parts: Vec<SceneNodeId> = Vec::new();
    let mut models = Vec::with_capacity(ANIMAL_COUNT);
    for i in 0..ANIMAL_COUNT {
        let body = scene.add_root(format!("animal{i}"));
        let tail = scene.add_child(body, format!("animal{i}_tail"))?;
        parts.extend([body, tail]);
        models.push(Some(body));
    }

    let mut backend = TimelineBackend::new();
    for &node in &parts {
        for &(clip, ticks) in CLIP_TICKS {
            backend.add_clip(node, clip, ticks);
        }
    }

    let config = AnimatorConfig { seed: SEED, ..AnimatorConfig::default() };
    let mut animator = Animator::new(config, scene, backend);
    for &node in &parts {
        animator.init(node, library.clone())?;
    }

    // 3. World: a fenced grid with a trough in the middle.
    let mut world = GridWorld::new(GRID_SIZE, GRID_SIZE);
    for x in 5..7 {
        world.block(Cell::new(x, 6));
    }
    for i in 0..ANIMAL_COUNT {
        world.place(ActorId(i as u32), Cell::new(2 + 2 * i as i32, 2));
    }

    // 4. Policies: even animals start working, odd ones idle.
    let policies: Vec<AnimalPolicy> = (0..ANIMAL_COUNT)
        .map(|i| if i % 2 == 0 { AnimalPolicy::working() } else { AnimalPolicy::default() })
        .collect();

    // 5. Runtime.
    let config = RuntimeConfig {
        tick_duration_ms:        TICK_DURATION_MS,
        total_ticks:             TOTAL_TICKS,
        seed:                    SEED,
        think_interval_ticks:    2,
        start_delay_ticks:       1,
        snapshot_interval_ticks: SNAPSHOT_INTERVAL,
    };
    let mut runtime = RuntimeBuilder::new(config, animator, world)
        .policies(policies)
        .models(models)
        .start_delays((0..ANIMAL_COUNT as u64).map(|i| 1 + i).collect())
        .build()?;

    // 6. Run, pausing at each scripted event.
    let mut log = PastureLog::default();
    let t0 = Instant::now();
    for &(tick, target, signal) in EVENTS {
        let wait = tick.saturating_sub(runtime.now().0);
        runtime.run_ticks(wait, &mut log)?;
        match target {
            Some(actor) => runtime.raise_signal(ActorId(actor), signal)?,
            None => runtime.emit(signal),
        }
        info!(%tick, ?target, signal, "event");
    }
    runtime.run(&mut log)?;
    let elapsed = t0.elapsed();

    // 7. Summary.
    println!();
    println!("Run complete in {:.3} s ({} evaluation cycles, {} snapshots)",
        elapsed.as_secs_f64(), log.cycles, log.snapshots);
    println!();
    println!("{:<8} {:<10} {:<14} {:<10} {:<6}", "Animal", "Schedule", "Clip", "Cell", "Cycles");
    println!("{}", "-".repeat(52));
    let snapshot = runtime.snapshot();
    for a in &snapshot {
        println!(
            "{:<8} {:<10} {:<14} {:<10} {:<6}",
            a.actor.0,
            a.schedule.as_deref().unwrap_or("-"),
            a.clip.as_deref().unwrap_or("-"),
            a.position.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
            a.run_count,
        );
    }

    let summary = json!({
        "ticks":  runtime.now().0,
        "cycles": log.cycles,
        "animals": snapshot.iter().map(|a| json!({
            "actor":    a.actor.0,
            "schedule": a.schedule,
            "clip":     a.clip,
            "x":        a.position.map(|c| c.x),
            "y":        a.position.map(|c| c.y),
        })).collect::<Vec<_>>(),
    });
    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
