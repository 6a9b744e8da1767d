//! Globally unique compute-node identifiers.

use crate::coords::NodeLocation;
use crate::ids::ChipId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The globally unique ID of one compute-grid cell.
///
/// Derived deterministically from the owning chip and the cell's location;
/// its canonical string form is `"<chip>-<row>-<col>"`, the same component
/// order as the placement document's `[row, col]` location arrays and the
/// per-core perf document's keys. The ops-to-pipes document is the odd one
/// out: it keys its per-core pipe maps by the reversed `"<chip>-<col>-<row>"`
/// form. Both forms are normalized here, at construction, and nowhere else.
///
/// Ordering is chip first, then row-major location, which is the stable
/// node iteration order of a loaded dataset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeUid {
    /// The chip this node belongs to.
    pub chip: ChipId,
    /// The node's grid location.
    pub location: NodeLocation,
}

impl NodeUid {
    /// Creates a UID from a chip and a canonical x/y location.
    pub fn new(chip: ChipId, location: NodeLocation) -> Self {
        Self { chip, location }
    }

    /// Creates a UID from the placement document's `[row, col]` location.
    pub fn from_netlist_location(chip: ChipId, row: u32, col: u32) -> Self {
        Self {
            chip,
            location: NodeLocation::from_row_col(row, col),
        }
    }

    /// Parses an ops-to-pipes core ID of the form `"<chip>-<col>-<row>"`.
    ///
    /// The middle and last components arrive transposed relative to the
    /// canonical form and are swapped during parsing.
    pub fn parse_transposed(s: &str) -> Result<Self, UidParseError> {
        let (chip, col, row) = split_uid(s)?;
        Ok(Self {
            chip: ChipId::from_raw(chip),
            location: NodeLocation::new(col, row),
        })
    }
}

fn split_uid(s: &str) -> Result<(u32, u32, u32), UidParseError> {
    let mut parts = s.splitn(3, '-');
    let mut next = || {
        parts
            .next()
            .ok_or_else(|| UidParseError::new(s))?
            .parse::<u32>()
            .map_err(|_| UidParseError::new(s))
    };
    let chip = next()?;
    let a = next()?;
    let b = next()?;
    Ok((chip, a, b))
}

/// A node UID string that does not match `"<chip>-<a>-<b>"` with numeric
/// components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed node uid '{uid}'")]
pub struct UidParseError {
    /// The offending UID string.
    pub uid: String,
}

impl UidParseError {
    fn new(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
        }
    }
}

impl FromStr for NodeUid {
    type Err = UidParseError;

    /// Parses the canonical form `"<chip>-<row>-<col>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chip, row, col) = split_uid(s)?;
        Ok(Self {
            chip: ChipId::from_raw(chip),
            location: NodeLocation::from_row_col(row, col),
        })
    }
}

impl fmt::Display for NodeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.chip, self.location.y, self.location.x)
    }
}

impl Serialize for NodeUid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeUid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
