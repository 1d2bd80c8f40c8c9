//! The `Animator` — per-node animation players over a scene arena, with
//! recursive play/stop/reset and completion aggregation.
//!
//! # Aggregation
//!
//! Every recursive play opens a [`Join`] on the node it starts from:
//!
//! ```text
//! in_progress = 1                    (the node's own clip)
//! for child with a player, within max_depth:
//!     in_progress += 1; play child → child reports into this join
//! start own clip                     → reports into this join
//! on each report: in_progress -= 1; worst = max(worst, reason)
//! in_progress == 0                   → deliver `worst` once, clear the join
//! ```
//!
//! A join is tagged with the op id that opened it.  Reports carry that id, so
//! a report arriving after its join was superseded is dropped instead of
//! corrupting the new one.  That is what makes restarting from inside a
//! completion callback safe.
//!
//! # Callback dispatch
//!
//! Root completions are queued, not invoked in place.  Each public operation
//! drains the queue before returning, and `play` also drains it between
//! stopping the old operation and starting the new one, so a `Restarted`
//! callback always runs before the replacement begins.

use std::collections::VecDeque;

use npc_core::{SceneNodeId, SimRng};
use tracing::{debug, trace, warn};

use crate::random::RandomRun;
use crate::{
    AnimError, AnimResult, AnimationMeta, ClipBackend, ClipLibrary, Outcome, PlaybackParams,
    Repeat, SceneGraph, StopReason,
};

/// Completion callback.  Receives the animator so it may start new playback.
pub type OnComplete = Box<dyn FnOnce(&mut Animator, &Outcome)>;

type OpId = u64;

// ── Config ────────────────────────────────────────────────────────────────────

/// Animator-wide settings.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimatorConfig {
    /// How many levels below the addressed node a command propagates.
    pub max_depth: u8,

    /// Multiplier on a clip's `chance` before the random-selection roll.
    pub chance_margin: f64,

    /// Global kill switch.  Players with `force_enabled` (or calls with
    /// `force`) still play.
    pub disable_animations: bool,

    /// Seed for random clip selection.
    pub seed: u64,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            max_depth:          2,
            chance_margin:      1.15,
            disable_animations: false,
            seed:               0,
        }
    }
}

// ── Internal state ────────────────────────────────────────────────────────────

/// Counter/accumulator for one in-flight recursive operation on one node.
struct Join {
    op:          OpId,
    in_progress: u32,
    worst:       StopReason,
    notify:      Notify,
}

/// Where a join delivers its aggregated reason.
pub(crate) enum Notify {
    /// Into the parent's join (this node was reached by recursion).
    Parent { node: SceneNodeId, op: OpId },
    /// To the caller of a public operation.
    Root(RootCompletion),
}

pub(crate) struct RootCompletion {
    pub(crate) clip:        String,
    pub(crate) on_complete: Option<OnComplete>,
    pub(crate) follow_up:   FollowUp,
}

/// What happens after a root completion's callback.
pub(crate) enum FollowUp {
    /// Play the descriptor's `next` clip on natural completion.
    Chain(Option<String>),
    /// Continue a pattern run.
    Random(RandomRun),
}

/// Local playback of one clip on one node (the node's "animation node").
struct ClipTrack {
    clip:      String,
    remaining: u32,
    params:    PlaybackParams,
    reset:     bool,
    op:        OpId,
}

/// One scene node's player.
#[derive(Default)]
pub(crate) struct PlayerState {
    pub(crate) library:       ClipLibrary,
    pub(crate) enabled:       bool,
    pub(crate) force_enabled: bool,
    current:                  Option<String>,
    join:                     Option<Join>,
    track:                    Option<ClipTrack>,
}

pub(crate) enum Ready {
    Callback { on_complete: OnComplete, outcome: Outcome },
    Root { node: SceneNodeId, completion: RootCompletion, reason: StopReason },
}

// ── Animator ──────────────────────────────────────────────────────────────────

/// Animation players for every node of a [`SceneGraph`], driving one
/// [`ClipBackend`].
///
/// A node only takes part in playback once it has a player
/// ([`attach_player`](Self::attach_player) or [`init`](Self::init)).
/// Commands addressed to a node propagate to descendants that have players,
/// up to [`AnimatorConfig::max_depth`] levels down.
///
/// # Example
///
/// ```rust,ignore
/// let mut scene = SceneGraph::new();
/// let body = scene.add_root("cow");
/// let tail = scene.add_child(body, "tail")?;
/// let backend = TimelineBackend::new()
///     .with_clip(body, "idle", 10)
///     .with_clip(tail, "idle", 10);
/// let mut animator = Animator::new(AnimatorConfig::default(), scene, backend);
/// animator.init(body, library.clone())?;
/// animator.init(tail, library)?;
/// animator.play(body, "idle", Repeat::Times(2), Some(Box::new(|_, outcome| {
///     println!("idle ended: {}", outcome.reason);
/// })), false)?;
/// animator.advance(20);
/// ```
pub struct Animator {
    pub(crate) config:  AnimatorConfig,
    scene:              SceneGraph,
    pub(crate) players: Vec<Option<PlayerState>>,
    backend:            Box<dyn ClipBackend>,
    pub(crate) rng:     SimRng,
    next_op:            OpId,
    ready:              VecDeque<Ready>,
}

impl Animator {
    pub fn new(config: AnimatorConfig, scene: SceneGraph, backend: impl ClipBackend + 'static) -> Self {
        let mut players = Vec::new();
        players.resize_with(scene.len(), || None);
        Self {
            rng: SimRng::new(config.seed),
            config,
            scene,
            players,
            backend: Box::new(backend),
            next_op: 0,
            ready: VecDeque::new(),
        }
    }

    // ── Scene & setup ─────────────────────────────────────────────────────

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn backend(&self) -> &dyn ClipBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Add a root node after construction.
    pub fn add_root(&mut self, name: impl Into<String>) -> SceneNodeId {
        let id = self.scene.add_root(name);
        self.players.push(None);
        id
    }

    /// Add a child node after construction.
    pub fn add_child(&mut self, parent: SceneNodeId, name: impl Into<String>) -> AnimResult<SceneNodeId> {
        let id = self.scene.add_child(parent, name)?;
        self.players.push(None);
        Ok(id)
    }

    /// Give `node` a player.  The player stays disabled until [`init`](Self::init).
    pub fn attach_player(&mut self, node: SceneNodeId) -> AnimResult<()> {
        let slot = self
            .players
            .get_mut(node.index())
            .ok_or(AnimError::UnknownNode(node))?;
        if slot.is_none() {
            *slot = Some(PlayerState::default());
        }
        Ok(())
    }

    /// Hand `node`'s player its clip descriptors and enable it.
    pub fn init(&mut self, node: SceneNodeId, library: ClipLibrary) -> AnimResult<()> {
        self.attach_player(node)?;
        let player = self.player_mut(node)?;
        debug!(%node, clips = library.len(), "animation player initialised");
        player.library = library;
        player.enabled = true;
        Ok(())
    }

    /// Let `node` play even while animations are globally disabled.
    pub fn set_force_enabled(&mut self, node: SceneNodeId, force: bool) -> AnimResult<()> {
        self.player_mut(node)?.force_enabled = force;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_enabled(&self, node: SceneNodeId) -> bool {
        self.slot(node).is_some_and(|p| p.enabled)
    }

    pub fn has_clip(&self, node: SceneNodeId, name: &str) -> bool {
        self.slot(node).is_some_and(|p| p.enabled && p.library.contains(name))
    }

    /// Clip names starting with `pattern` in registration order.
    pub fn clip_names(&self, node: SceneNodeId, pattern: Option<&str>) -> Vec<String> {
        self.slot(node)
            .map(|p| p.library.names_with_prefix(pattern))
            .unwrap_or_default()
    }

    /// The clip of the operation currently in flight on `node`.
    pub fn current_clip(&self, node: SceneNodeId) -> Option<&str> {
        self.slot(node).and_then(|p| p.current.as_deref())
    }

    /// `true` while an operation on `node` has not delivered its outcome.
    pub fn in_flight(&self, node: SceneNodeId) -> bool {
        self.slot(node).is_some_and(|p| p.join.is_some())
    }

    /// `true` if `node`'s own clip is running (optionally: and is `name`).
    pub fn is_playing(&self, node: SceneNodeId, name: Option<&str>) -> bool {
        let Some(player) = self.slot(node) else { return false };
        match (&player.current, &player.track) {
            (Some(current), Some(track)) => {
                name.is_none_or(|n| n == current) && self.backend.is_playing(node, &track.clip)
            }
            _ => false,
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Play `name` on `node` and every descendant player within the depth
    /// bound.  `on_complete` fires exactly once with the aggregated reason.
    ///
    /// Unknown clips, disabled players and globally disabled animations
    /// (without `force`) resolve to [`StopReason::Unplayable`].
    pub fn play(
        &mut self,
        node:        SceneNodeId,
        name:        &str,
        repeat:      Repeat,
        on_complete: Option<OnComplete>,
        force:       bool,
    ) -> AnimResult<()> {
        let player = self.player(node)?;
        if !player.enabled {
            self.fire(on_complete, Outcome::new(name, StopReason::Unplayable));
            self.dispatch();
            return Ok(());
        }
        let same_clip = player.current.as_deref() == Some(name);
        let blocked = self.config.disable_animations && !player.force_enabled && !force;
        let meta = player.library.get(name).cloned();

        self.halt(node, StopReason::Restarted, 0);
        self.dispatch();

        let meta = match meta {
            Some(meta) if !blocked => meta,
            _ => {
                trace!(%node, clip = name, blocked, "clip unplayable");
                self.fire(on_complete, Outcome::new(name, StopReason::Unplayable));
                self.dispatch();
                return Ok(());
            }
        };

        let passes = repeat.resolve(&meta);
        if !same_clip || passes == 1 {
            self.rewind_tree(node, &meta.name, 0);
        }
        debug!(%node, clip = name, passes, "play");
        let completion = RootCompletion {
            clip:        meta.name.clone(),
            on_complete,
            follow_up:   FollowUp::Chain(meta.next.clone()),
        };
        self.recursive_play(node, &meta, passes, Notify::Root(completion), 0);
        self.dispatch();
        Ok(())
    }

    /// Play `name` until stopped.
    pub fn loop_clip(&mut self, node: SceneNodeId, name: &str) -> AnimResult<()> {
        self.play(node, name, Repeat::Forever, None, false)
    }

    /// Skip `name`: stop what is playing, put every participant on the clip's
    /// last frame and complete immediately as if it had finished.
    pub fn go_to(&mut self, node: SceneNodeId, name: &str, on_complete: Option<OnComplete>) -> AnimResult<()> {
        let player = self.player(node)?;
        if !player.enabled {
            self.fire(on_complete, Outcome::new(name, StopReason::Unplayable));
            self.dispatch();
            return Ok(());
        }
        let meta = player.library.get(name).cloned();

        self.halt(node, StopReason::Aborted, 0);
        self.dispatch();

        match meta {
            None => self.fire(on_complete, Outcome::new(name, StopReason::Unplayable)),
            Some(meta) => {
                self.seek_tree(node, &meta.name, 0);
                self.ready.push_back(Ready::Root {
                    node,
                    completion: RootCompletion {
                        clip:      meta.name.clone(),
                        on_complete,
                        follow_up: FollowUp::Chain(meta.next.clone()),
                    },
                    reason: StopReason::Finished,
                });
            }
        }
        self.dispatch();
        Ok(())
    }

    /// Halt `node` and its descendants.  Pending callbacks fire with
    /// [`StopReason::Aborted`].  Safe in any state, including on disabled
    /// players.
    pub fn stop(&mut self, node: SceneNodeId) -> AnimResult<()> {
        self.player(node)?;
        self.halt(node, StopReason::Aborted, 0);
        self.dispatch();
        Ok(())
    }

    /// Rewind the current clip on `node` and its descendants without
    /// changing play state.
    pub fn reset(&mut self, node: SceneNodeId) -> AnimResult<()> {
        if let Some(clip) = self.player(node)?.current.clone() {
            self.rewind_tree(node, &clip, 0);
        }
        Ok(())
    }

    /// Advance the backend by `elapsed` ticks and resolve finished passes.
    pub fn advance(&mut self, elapsed: u64) {
        let finished = self.backend.poll_finished(elapsed);
        for pass in finished {
            self.on_pass_finished(pass.node, &pass.clip);
        }
        self.dispatch();
    }

    /// Entry point for push-style backends that learn about pass ends on
    /// their own.
    pub fn notify_pass_finished(&mut self, node: SceneNodeId, clip: &str) {
        self.on_pass_finished(node, clip);
        self.dispatch();
    }

    // ── Recursion ─────────────────────────────────────────────────────────

    pub(crate) fn recursive_play(
        &mut self,
        node:   SceneNodeId,
        meta:   &AnimationMeta,
        passes: u32,
        notify: Notify,
        depth:  u8,
    ) {
        if self.in_flight(node) {
            self.halt(node, StopReason::Restarted, depth);
        }
        self.next_op += 1;
        let op = self.next_op;
        let Some(Some(player)) = self.players.get_mut(node.index()) else {
            self.deliver(node, notify, StopReason::Unplayable);
            return;
        };
        player.current = Some(meta.name.clone());
        player.join = Some(Join {
            op,
            in_progress: 1,
            worst:       StopReason::Undefined,
            notify,
        });

        if depth < self.config.max_depth {
            for child in self.player_children(node) {
                if let Some(join) = self.join_mut(node, op) {
                    join.in_progress += 1;
                }
                self.recursive_play(child, meta, passes, Notify::Parent { node, op }, depth + 1);
            }
        }

        self.start_track(node, op, meta, passes);
    }

    pub(crate) fn halt(&mut self, node: SceneNodeId, reason: StopReason, depth: u8) {
        if depth < self.config.max_depth {
            for child in self.player_children(node) {
                self.halt(child, reason, depth + 1);
            }
        }
        self.stop_track(node, reason);

        // Participants out of this call's reach keep their reports; they
        // will arrive stale and be dropped.
        let orphaned = match self.players.get_mut(node.index()) {
            Some(Some(player)) => {
                let join = player.join.take();
                if join.is_some() {
                    player.current = None;
                }
                join
            }
            _ => None,
        };
        if let Some(join) = orphaned {
            self.deliver(node, join.notify, join.worst.max(reason));
        }
    }

    pub(crate) fn rewind_tree(&mut self, node: SceneNodeId, clip: &str, depth: u8) {
        if depth < self.config.max_depth {
            for child in self.player_children(node) {
                self.rewind_tree(child, clip, depth + 1);
            }
        }
        self.backend.rewind(node, clip);
    }

    fn seek_tree(&mut self, node: SceneNodeId, clip: &str, depth: u8) {
        if depth < self.config.max_depth {
            for child in self.player_children(node) {
                self.seek_tree(child, clip, depth + 1);
            }
        }
        self.backend.seek_to_end(node, clip);
    }

    // ── Local playback ────────────────────────────────────────────────────

    fn start_track(&mut self, node: SceneNodeId, op: OpId, meta: &AnimationMeta, passes: u32) {
        if !self.backend.has_clip(node, &meta.name) {
            self.report(node, op, StopReason::Unplayable);
            return;
        }
        let params = meta.params();
        self.backend.start(node, &meta.name, params);
        if let Some(Some(player)) = self.players.get_mut(node.index()) {
            player.track = Some(ClipTrack {
                clip:      meta.name.clone(),
                remaining: passes.max(1),
                params,
                reset:     meta.reset,
                op,
            });
        }
    }

    fn stop_track(&mut self, node: SceneNodeId, reason: StopReason) {
        let track = match self.players.get_mut(node.index()) {
            Some(Some(player)) => player.track.take(),
            _ => None,
        };
        let Some(track) = track else { return };
        if track.reset {
            self.backend.rewind(node, &track.clip);
        }
        self.backend.stop(node, &track.clip);
        self.report(node, track.op, reason);
    }

    fn on_pass_finished(&mut self, node: SceneNodeId, clip: &str) {
        let Some(Some(player)) = self.players.get_mut(node.index()) else { return };
        let Some(track) = player.track.as_mut() else { return };
        if track.clip != clip {
            return;
        }
        track.remaining = track.remaining.saturating_sub(1);
        if track.remaining > 0 {
            let params = track.params;
            self.backend.rewind(node, clip);
            self.backend.start(node, clip, params);
            return;
        }
        let Some(track) = player.track.take() else { return };
        if track.reset {
            self.backend.rewind(node, clip);
        }
        self.backend.stop(node, clip);
        self.report(node, track.op, StopReason::Finished);
    }

    // ── Aggregation ───────────────────────────────────────────────────────

    fn report(&mut self, node: SceneNodeId, op: OpId, reason: StopReason) {
        let completed = {
            let Some(Some(player)) = self.players.get_mut(node.index()) else { return };
            match player.join.as_mut() {
                Some(join) if join.op == op => {
                    join.in_progress = join.in_progress.saturating_sub(1);
                    join.worst = join.worst.max(reason);
                    if join.in_progress > 0 {
                        return;
                    }
                }
                _ => {
                    trace!(%node, op, %reason, "stale report dropped");
                    return;
                }
            }
            player.current = None;
            player.join.take()
        };
        if let Some(join) = completed {
            self.deliver(node, join.notify, join.worst);
        }
    }

    fn deliver(&mut self, node: SceneNodeId, notify: Notify, reason: StopReason) {
        match notify {
            Notify::Parent { node: parent, op } => self.report(parent, op, reason),
            Notify::Root(completion) => {
                debug!(%node, clip = %completion.clip, %reason, "playback completed");
                self.ready.push_back(Ready::Root { node, completion, reason });
            }
        }
    }

    pub(crate) fn fire(&mut self, on_complete: Option<OnComplete>, outcome: Outcome) {
        if let Some(on_complete) = on_complete {
            self.ready.push_back(Ready::Callback { on_complete, outcome });
        }
    }

    pub(crate) fn dispatch(&mut self) {
        while let Some(ready) = self.ready.pop_front() {
            match ready {
                Ready::Callback { on_complete, outcome } => on_complete(self, &outcome),
                Ready::Root { node, completion, reason } => self.complete_root(node, completion, reason),
            }
        }
    }

    fn complete_root(&mut self, node: SceneNodeId, completion: RootCompletion, reason: StopReason) {
        let RootCompletion { clip, on_complete, follow_up } = completion;
        match follow_up {
            FollowUp::Chain(next) => {
                if let Some(on_complete) = on_complete {
                    on_complete(self, &Outcome::new(clip.as_str(), reason));
                }
                if let (true, Some(next)) = (reason.is_natural(), next) {
                    debug!(%node, from = %clip, to = %next, "chained clip");
                    if let Err(err) = self.play(node, &next, Repeat::FromConfig, None, false) {
                        warn!(%node, clip = %next, %err, "chained play failed");
                    }
                }
            }
            FollowUp::Random(run) => self.continue_random(node, run, reason),
        }
    }

    // ── Lookup helpers ────────────────────────────────────────────────────

    pub(crate) fn slot(&self, node: SceneNodeId) -> Option<&PlayerState> {
        self.players.get(node.index()).and_then(Option::as_ref)
    }

    pub(crate) fn player(&self, node: SceneNodeId) -> AnimResult<&PlayerState> {
        match self.players.get(node.index()) {
            None => Err(AnimError::UnknownNode(node)),
            Some(None) => Err(AnimError::NoPlayer(node)),
            Some(Some(player)) => Ok(player),
        }
    }

    fn player_mut(&mut self, node: SceneNodeId) -> AnimResult<&mut PlayerState> {
        match self.players.get_mut(node.index()) {
            None => Err(AnimError::UnknownNode(node)),
            Some(None) => Err(AnimError::NoPlayer(node)),
            Some(Some(player)) => Ok(player),
        }
    }

    fn join_mut(&mut self, node: SceneNodeId, op: OpId) -> Option<&mut Join> {
        self.players
            .get_mut(node.index())
            .and_then(Option::as_mut)
            .and_then(|p| p.join.as_mut())
            .filter(|j| j.op == op)
    }

    /// Children of `node` that have a player.
    fn player_children(&self, node: SceneNodeId) -> Vec<SceneNodeId> {
        self.scene
            .children(node)
            .iter()
            .copied()
            .filter(|c| self.slot(*c).is_some())
            .collect()
    }
}
