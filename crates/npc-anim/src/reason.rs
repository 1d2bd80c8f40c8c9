//! Stop reasons and the outcome handed to completion callbacks.

use std::fmt;

/// Why a playback attempt ended.
///
/// Variants are declared in ascending severity; aggregation over a node tree
/// reports the maximum observed, so `Ord` is the aggregation order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StopReason {
    /// No participant has reported yet.
    #[default]
    Undefined,
    /// The clip does not exist for this participant; reported immediately.
    Unplayable,
    /// Every pass played to the end.
    Finished,
    /// A new play replaced this one before it ended.
    Restarted,
    /// Stopped explicitly.
    Aborted,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Undefined  => "undefined",
            StopReason::Unplayable => "unplayable",
            StopReason::Finished   => "finished",
            StopReason::Restarted  => "restarted",
            StopReason::Aborted    => "aborted",
        }
    }

    /// `true` only for [`StopReason::Finished`].  Chaining and pattern runs
    /// continue on natural completion alone.
    #[inline]
    pub fn is_natural(self) -> bool {
        self == StopReason::Finished
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a completion callback receives: the clip (or pattern) the operation
/// was about, and the aggregated reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub clip:   String,
    pub reason: StopReason,
}

impl Outcome {
    pub fn new(clip: impl Into<String>, reason: StopReason) -> Self {
        Self { clip: clip.into(), reason }
    }
}
