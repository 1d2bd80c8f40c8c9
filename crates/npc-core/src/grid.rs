//! Integer grid cells used for positions and world queries.
//!
//! Actors live on a tile map; positions exchanged with the world collaborator
//! are whole cells.  Sub-cell rendering positions are the renderer's business.

/// A cell on the world's tile grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (4-neighbour) distance in cells.
    #[inline]
    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev (8-neighbour) distance in cells.
    #[inline]
    pub fn chebyshev(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// `true` if `other` lies within `tolerance` cells on both axes.
    ///
    /// Movement tasks use this to decide whether an in-flight move is still
    /// heading to the waypoint they asked for.
    #[inline]
    pub fn is_close(self, other: Cell, tolerance: u32) -> bool {
        self.chebyshev(other) <= tolerance
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
