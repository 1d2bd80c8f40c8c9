//! Pattern runs: play clips whose names start with a prefix, picking a new
//! one at random each time the previous finishes.
//!
//! Each step picks uniformly among the matching clips, then rolls against
//! the pick's `chance` scaled by [`AnimatorConfig::chance_margin`]; a failed
//! roll falls back to the first matching clip.  The pick's resolved repeat
//! count becomes the number of steps the run still owes.
//!
//! [`AnimatorConfig::chance_margin`]: crate::AnimatorConfig::chance_margin

use npc_core::SceneNodeId;
use tracing::{debug, warn};

use crate::player::{FollowUp, Notify, RootCompletion};
use crate::{AnimResult, AnimationMeta, Animator, OnComplete, Outcome, Repeat, StopReason};

/// State carried between the steps of one pattern run.
pub(crate) struct RandomRun {
    pattern:     String,
    candidates:  Vec<String>,
    remaining:   Repeat,
    on_complete: Option<OnComplete>,
    last:        Option<String>,
}

impl RandomRun {
    /// The clip to name in the final outcome.
    fn outcome_clip(&mut self) -> String {
        self.last
            .take()
            .or_else(|| self.candidates.first().cloned())
            .unwrap_or_else(|| self.pattern.clone())
    }
}

impl Animator {
    /// Start a pattern run over the clips whose names start with `pattern`.
    ///
    /// `repeat` caps the number of steps; [`Repeat::FromConfig`] lets the
    /// first pick's descriptor decide.  `on_complete` fires once, when the
    /// run ends, with the last clip played.
    pub fn play_random_with_pattern(
        &mut self,
        node:        SceneNodeId,
        pattern:     &str,
        repeat:      Repeat,
        on_complete: Option<OnComplete>,
    ) -> AnimResult<()> {
        let player = self.player(node)?;
        if !player.enabled {
            self.fire(on_complete, Outcome::new(pattern, StopReason::Unplayable));
            self.dispatch();
            return Ok(());
        }
        let run = RandomRun {
            pattern:    pattern.to_owned(),
            candidates: player.library.names_with_prefix(Some(pattern)),
            remaining:  repeat,
            on_complete,
            last:       None,
        };
        debug!(%node, pattern, candidates = run.candidates.len(), "random run");
        self.random_step(node, run);
        self.dispatch();
        Ok(())
    }

    pub(crate) fn continue_random(&mut self, node: SceneNodeId, mut run: RandomRun, reason: StopReason) {
        if reason.is_natural() {
            self.random_step(node, run);
        } else {
            let clip = run.outcome_clip();
            self.fire(run.on_complete.take(), Outcome::new(clip, reason));
        }
    }

    fn random_step(&mut self, node: SceneNodeId, mut run: RandomRun) {
        let force = self.slot(node).is_some_and(|p| p.force_enabled);
        if run.candidates.is_empty() || (self.config.disable_animations && !force) {
            self.halt(node, StopReason::Aborted, 0);
            let clip = run.outcome_clip();
            self.fire(run.on_complete.take(), Outcome::new(clip, StopReason::Unplayable));
            return;
        }
        if run.remaining == Repeat::Times(0) {
            let clip = run.outcome_clip();
            self.fire(run.on_complete.take(), Outcome::new(clip, StopReason::Finished));
            return;
        }
        if run.candidates.len() == 1 {
            let name = run.candidates.swap_remove(0);
            if let Err(err) = self.play(node, &name, run.remaining, run.on_complete.take(), false) {
                warn!(%node, clip = %name, %err, "single-candidate random play failed");
            }
            return;
        }

        self.halt(node, StopReason::Restarted, 0);
        self.dispatch();

        let Some(meta) = self.pick(node, &run.candidates) else {
            let clip = run.outcome_clip();
            self.fire(run.on_complete.take(), Outcome::new(clip, StopReason::Unplayable));
            return;
        };
        let steps = run.remaining.resolve(&meta);
        if steps == 0 {
            let clip = run.outcome_clip();
            self.fire(run.on_complete.take(), Outcome::new(clip, StopReason::Finished));
            return;
        }
        run.remaining = Repeat::Times(steps - 1);
        run.last = Some(meta.name.clone());
        debug!(%node, clip = %meta.name, steps_left = steps - 1, "random pick");

        self.rewind_tree(node, &meta.name, 0);
        let completion = RootCompletion {
            clip:        meta.name.clone(),
            on_complete: None,
            follow_up:   FollowUp::Random(run),
        };
        self.recursive_play(node, &meta, 1, Notify::Root(completion), 0);
    }

    /// Uniform pick biased by `chance`; a failed roll falls back to the first
    /// candidate.
    fn pick(&mut self, node: SceneNodeId, candidates: &[String]) -> Option<AnimationMeta> {
        let library = &self.players.get(node.index())?.as_ref()?.library;
        let index = self.rng.gen_range(0..candidates.len());
        let mut meta = library.get(&candidates[index])?;
        let roll: f64 = self.rng.random();
        if meta.chance * self.config.chance_margin < roll {
            meta = library.get(&candidates[0])?;
        }
        Some(meta.clone())
    }
}
