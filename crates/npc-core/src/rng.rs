//! Seeded random sources.
//!
//! | Type       | Owner                  | Used for                                   |
//! |------------|------------------------|--------------------------------------------|
//! | `ActorRng` | one behavior driver    | wander targets, gait coin flips            |
//! | `SimRng`   | the `Animator`         | random clip picks and their chance rolls   |
//!
//! Actor streams are derived from the run seed and the actor index, so adding
//! actors at the end of the list leaves earlier actors' draws unchanged.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::distributions::{Distribution, Standard};

use crate::ActorId;

/// Golden-ratio odd constant; spreads consecutive actor indices apart.
const ACTOR_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

// ── ActorRng ──────────────────────────────────────────────────────────────────

/// Random stream owned by a single actor and handed to its policy via `Env`.
pub struct ActorRng(SmallRng);

impl ActorRng {
    pub fn new(run_seed: u64, actor: ActorId) -> Self {
        let seed = run_seed ^ u64::from(actor.0).wrapping_mul(ACTOR_SPREAD);
        ActorRng(SmallRng::seed_from_u64(seed))
    }

    /// `true` with probability `p`; out-of-range values are clamped.
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform pick from `items`, `None` when empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.0)
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Random stream shared by everything the animator decides.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// A `Standard` sample; for `f64` that is uniform in `[0, 1)`.
    pub fn random<T>(&mut self) -> T
    where
        Standard: Distribution<T>,
    {
        self.0.r#gen()
    }
}
