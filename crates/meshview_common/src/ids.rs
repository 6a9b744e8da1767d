//! Opaque ID newtypes for mesh entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, copyable ID for one chip in a multi-chip dataset.
///
/// Chip IDs come straight from the analyzer output (`chip_id` in the
/// placement document, the key set of the cluster descriptor's `chips` map)
/// and are stable for the lifetime of a loaded dataset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChipId(u32);

impl ChipId {
    /// Creates a chip ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a data-movement pipe.
///
/// All segments of one pipe, across every link it traverses, share one
/// `PipeId`. The analyzer emits these as strings (usually numeric, but the
/// format is opaque to us), so the ID is kept verbatim.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipeId(String);

impl PipeId {
    /// Creates a pipe ID from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PipeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
