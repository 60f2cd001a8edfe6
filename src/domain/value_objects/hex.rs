//! Axial hex coordinates
//!
//! The board uses axial `(q, r)` coordinates with the implicit cube
//! coordinate `s = -q - r`.

use serde::{Deserialize, Serialize};

/// Neighbor offsets, in the fixed order used for every deterministic scan
pub const HEX_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// A hex on the board in axial coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AxialCoord {
    pub q: i32,
    pub r: i32,
}

impl AxialCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance in steps, ignoring terrain
    pub fn distance(&self, other: &AxialCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        dq.max(dr).max(ds) as u32
    }

    pub fn neighbors(&self) -> [AxialCoord; 6] {
        HEX_DIRECTIONS.map(|(dq, dr)| AxialCoord::new(self.q + dq, self.r + dr))
    }

    pub fn is_adjacent(&self, other: &AxialCoord) -> bool {
        self.distance(other) == 1
    }
}

impl std::fmt::Display for AxialCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
