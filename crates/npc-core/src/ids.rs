//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Arena-backed IDs (`ActorId`,
//! `SceneNodeId`) index directly into `Vec`s via `.index()`; handle-style IDs
//! (`ScheduleId`, `TimerId`, `MoveId`) are issued from monotonic counters and
//! never reused within a run.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — the inner type's maximum.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// The next id in sequence.  Used by monotonic id allocators.
            #[inline(always)]
            pub fn next(self) -> $name {
                $name(self.0 + 1)
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an actor (one behavior driver) in the runtime.
    pub struct ActorId(u32);
}

typed_id! {
    /// Index of a node in the animation scene arena.
    pub struct SceneNodeId(u32);
}

typed_id! {
    /// Handle of one `Schedule` instance.  A superseded schedule's id is never
    /// handed out again.
    pub struct ScheduleId(u64);
}

typed_id! {
    /// Handle of one armed timer in the timer queue.
    pub struct TimerId(u64);
}

typed_id! {
    /// Handle of one movement request issued to the world collaborator.
    pub struct MoveId(u64);
}
