//! Grid coordinates for compute nodes.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The position of a node in a chip's compute grid.
///
/// `x` is the column (left to right) and `y` is the row (top to bottom).
/// The analyzer's placement document stores locations as `[row, col]`
/// arrays; [`NodeLocation::from_row_col`] is the single place where that
/// ordering is translated, so no other code re-derives it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct NodeLocation {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl NodeLocation {
    /// Creates a location from explicit x/y coordinates.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Creates a location from the placement document's `[row, col]` order.
    pub fn from_row_col(row: u32, col: u32) -> Self {
        Self { x: col, y: row }
    }
}

impl PartialOrd for NodeLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeLocation {
    /// Row-major ordering: by row first, then column. This is the stable
    /// iteration order for a chip's node set.
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl fmt::Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}
