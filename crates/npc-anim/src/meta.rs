//! Clip descriptors: `AnimationMeta`, `Repeat`, and the per-player
//! `ClipLibrary`.
//!
//! A descriptor is immutable once loaded.  Players hold a `ClipLibrary`
//! that keeps descriptors in registration order, because pattern-based
//! selection falls back to "the first matching clip" and that must mean the
//! first one the content author listed.

use crate::ClipMap;

// ── Repeat ────────────────────────────────────────────────────────────────────

/// How many passes a clip should play.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Repeat {
    /// Request sentinel: use the descriptor's configured repeat.
    #[default]
    FromConfig,
    /// Play until stopped.
    Forever,
    /// Play exactly `n` passes.
    Times(u32),
}

impl Repeat {
    /// Pass count standing in for "forever".  Decremented once per pass, so
    /// it never runs out in practice.
    pub const UNBOUNDED: u32 = u32::MAX;

    /// Resolve request sentinels against `meta` into a concrete pass count.
    pub fn resolve(self, meta: &AnimationMeta) -> u32 {
        match self {
            Repeat::FromConfig => match meta.repeat {
                Repeat::FromConfig => 1,
                configured => configured.resolve(meta),
            },
            Repeat::Forever => Self::UNBOUNDED,
            Repeat::Times(n) => n,
        }
    }
}

impl From<i32> for Repeat {
    /// Content files encode repeats as integers: `-1` loops forever, `-2`
    /// defers to the descriptor, anything else is a literal pass count.
    fn from(n: i32) -> Self {
        match n {
            -1 => Repeat::Forever,
            -2 => Repeat::FromConfig,
            n => Repeat::Times(n.max(0) as u32),
        }
    }
}

// ── WrapMode ──────────────────────────────────────────────────────────────────

/// Loop mode handed to the clip backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WrapMode {
    /// Play start to end once per pass.
    #[default]
    Once,
    /// Play forth and back once per pass.
    PingPong,
}

// ── SoundCue ──────────────────────────────────────────────────────────────────

/// Sound-trigger metadata attached to a clip.
///
/// Carried for the audio layer; the animator never plays sounds itself.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoundCue {
    /// Candidate sound names; the audio layer picks one.
    pub names:  Vec<String>,
    /// Frames on which the sound triggers.  Empty = once at clip start.
    pub frames: Vec<u32>,
    /// Probability of playing at all.  `None` = always.
    pub chance: Option<f64>,
    pub volume: Option<f32>,
}

// ── AnimationMeta ─────────────────────────────────────────────────────────────

/// Immutable descriptor of a playable clip.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationMeta {
    pub name: String,

    /// Configured repeat used when a caller passes [`Repeat::FromConfig`].
    pub repeat: Repeat,

    /// Playback speed multiplier.
    pub speed: f32,

    pub wrap: WrapMode,

    /// Clip to play automatically after this one finishes naturally.
    pub next: Option<String>,

    pub sound: Option<SoundCue>,

    /// Selection weight for random pattern playback, nominally in `[0, 1]`.
    pub chance: f64,

    /// Rewind to the first frame when playback stops.
    pub reset: bool,
}

impl AnimationMeta {
    /// A descriptor with defaults: one pass, speed 1, no chaining, full chance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            repeat: Repeat::Times(1),
            speed:  1.0,
            wrap:   WrapMode::Once,
            next:   None,
            sound:  None,
            chance: 1.0,
            reset:  false,
        }
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = chance;
        self
    }

    pub fn ping_pong(mut self) -> Self {
        self.wrap = WrapMode::PingPong;
        self
    }

    pub fn resetting(mut self) -> Self {
        self.reset = true;
        self
    }

    /// Backend parameters for one pass of this clip.
    pub fn params(&self) -> PlaybackParams {
        PlaybackParams { speed: self.speed, wrap: self.wrap }
    }
}

/// Per-pass playback parameters handed to the clip backend.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaybackParams {
    pub speed: f32,
    pub wrap:  WrapMode,
}

// ── ClipLibrary ───────────────────────────────────────────────────────────────

/// The descriptors known to one animation player, in registration order.
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: Vec<AnimationMeta>,
    index: ClipMap<String, usize>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `meta`.  Re-registering a name replaces the descriptor in
    /// place and keeps its original position.
    pub fn insert(&mut self, meta: AnimationMeta) {
        match self.index.get(&meta.name) {
            Some(&i) => self.clips[i] = meta,
            None => {
                self.index.insert(meta.name.clone(), self.clips.len());
                self.clips.push(meta);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnimationMeta> {
        self.index.get(name).map(|&i| &self.clips[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names starting with `pattern`, in registration order.  `None` matches
    /// every clip.
    pub fn names_with_prefix(&self, pattern: Option<&str>) -> Vec<String> {
        self.clips
            .iter()
            .filter(|m| pattern.is_none_or(|p| m.name.starts_with(p)))
            .map(|m| m.name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationMeta> {
        self.clips.iter()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl FromIterator<AnimationMeta> for ClipLibrary {
    fn from_iter<I: IntoIterator<Item = AnimationMeta>>(iter: I) -> Self {
        let mut library = ClipLibrary::new();
        for meta in iter {
            library.insert(meta);
        }
        library
    }
}
