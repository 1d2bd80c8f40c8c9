//! The clip backend capability and an in-memory timeline implementation.
//!
//! The animator never renders anything.  It orchestrates a backend that can,
//! per (scene node, clip name): start one pass, stop, rewind, jump to the last
//! frame, and report passes that reached their end.  Engines plug their own
//! renderer in here; [`TimelineBackend`] advances clip cursors on the runtime
//! tick and is what the tests and the demo run against.

use std::collections::BTreeMap;

use npc_core::SceneNodeId;

use crate::{PlaybackParams, WrapMode};

/// One pass of a clip reached its end on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassFinished {
    pub node: SceneNodeId,
    pub clip: String,
}

/// Leaf playback capability driven by the [`Animator`][crate::Animator].
///
/// # Contract
///
/// - `start` plays exactly one pass from the current cursor (from the first
///   frame if the cursor sits at the end).  The end of that pass is reported
///   once through `poll_finished`, after which the clip is no longer playing.
/// - `stop`, `rewind`, `seek_to_end` on an unknown clip are no-ops.
/// - `poll_finished` must report in a deterministic order.
pub trait ClipBackend {
    /// `true` if `node` has a playable resource named `clip`.
    fn has_clip(&self, node: SceneNodeId, clip: &str) -> bool;

    fn start(&mut self, node: SceneNodeId, clip: &str, params: PlaybackParams);

    fn stop(&mut self, node: SceneNodeId, clip: &str);

    /// Move the cursor to the first frame without changing play state.
    fn rewind(&mut self, node: SceneNodeId, clip: &str);

    /// Move the cursor to the last frame without changing play state.
    fn seek_to_end(&mut self, node: SceneNodeId, clip: &str);

    fn is_playing(&self, node: SceneNodeId, clip: &str) -> bool;

    /// Normalized cursor in `[0, 1]`, if the backend can tell.
    fn cursor(&self, _node: SceneNodeId, _clip: &str) -> Option<f32> {
        None
    }

    /// Advance by `elapsed` ticks and return every pass that ended.
    fn poll_finished(&mut self, elapsed: u64) -> Vec<PassFinished>;
}

// ── TimelineBackend ───────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct TimelineClip {
    /// Length of one forward sweep at speed 1, in ticks.
    length:   u64,
    /// Position within the current pass, in ticks.
    position: f64,
    /// Length of the current pass (doubled for ping-pong).
    pass_len: f64,
    speed:    f32,
    playing:  bool,
}

/// Tick-driven in-memory clip backend.
///
/// Clips are registered per scene node with a length in ticks.  Entries are
/// kept in a `BTreeMap` so finished passes come out in `(node, clip)` order.
#[derive(Clone, Debug, Default)]
pub struct TimelineBackend {
    clips: BTreeMap<(SceneNodeId, String), TimelineClip>,
}

impl TimelineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip on `node` lasting `length_ticks` ticks at speed 1.
    pub fn add_clip(&mut self, node: SceneNodeId, clip: impl Into<String>, length_ticks: u64) {
        let length = length_ticks.max(1);
        self.clips.insert(
            (node, clip.into()),
            TimelineClip {
                length,
                position: 0.0,
                pass_len: length as f64,
                speed:    1.0,
                playing:  false,
            },
        );
    }

    /// Builder-style [`add_clip`](Self::add_clip).
    pub fn with_clip(mut self, node: SceneNodeId, clip: impl Into<String>, length_ticks: u64) -> Self {
        self.add_clip(node, clip, length_ticks);
        self
    }

    /// Number of clips currently playing across all nodes.
    pub fn playing_count(&self) -> usize {
        self.clips.values().filter(|c| c.playing).count()
    }

    fn clip_mut(&mut self, node: SceneNodeId, clip: &str) -> Option<&mut TimelineClip> {
        self.clips.get_mut(&(node, clip.to_owned()))
    }

    fn clip(&self, node: SceneNodeId, clip: &str) -> Option<&TimelineClip> {
        self.clips.get(&(node, clip.to_owned()))
    }
}

impl ClipBackend for TimelineBackend {
    fn has_clip(&self, node: SceneNodeId, clip: &str) -> bool {
        self.clip(node, clip).is_some()
    }

    fn start(&mut self, node: SceneNodeId, clip: &str, params: PlaybackParams) {
        if let Some(c) = self.clip_mut(node, clip) {
            c.speed = params.speed;
            c.pass_len = match params.wrap {
                WrapMode::Once     => c.length as f64,
                WrapMode::PingPong => (c.length * 2) as f64,
            };
            if c.position >= c.pass_len {
                c.position = 0.0;
            }
            c.playing = true;
        }
    }

    fn stop(&mut self, node: SceneNodeId, clip: &str) {
        if let Some(c) = self.clip_mut(node, clip) {
            c.playing = false;
        }
    }

    fn rewind(&mut self, node: SceneNodeId, clip: &str) {
        if let Some(c) = self.clip_mut(node, clip) {
            c.position = 0.0;
        }
    }

    fn seek_to_end(&mut self, node: SceneNodeId, clip: &str) {
        if let Some(c) = self.clip_mut(node, clip) {
            c.position = c.pass_len;
        }
    }

    fn is_playing(&self, node: SceneNodeId, clip: &str) -> bool {
        self.clip(node, clip).is_some_and(|c| c.playing)
    }

    fn cursor(&self, node: SceneNodeId, clip: &str) -> Option<f32> {
        self.clip(node, clip)
            .map(|c| (c.position / c.pass_len).clamp(0.0, 1.0) as f32)
    }

    fn poll_finished(&mut self, elapsed: u64) -> Vec<PassFinished> {
        let mut finished = Vec::new();
        for ((node, name), c) in self.clips.iter_mut() {
            if !c.playing {
                continue;
            }
            c.position += elapsed as f64 * c.speed.max(0.0) as f64;
            if c.position >= c.pass_len {
                c.position = c.pass_len;
                c.playing = false;
                finished.push(PassFinished { node: *node, clip: name.clone() });
            }
        }
        finished
    }
}
