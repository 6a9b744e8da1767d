//! Recorded, non-fatal data-integrity conditions.
//!
//! These are conditions worth surfacing to the user but not worth aborting
//! a chip's load over. They are appended to the per-chip log during
//! augmentation and queried by kind afterwards; they never interrupt the
//! pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The typed kinds of recordable integrity conditions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DataIntegrityErrorKind {
    /// `min(slowest_op_cycles, bw_limited_op_cycles)` came out zero.
    /// Downstream saturation math divides by this value.
    TotalOpCyclesIsZero,
}

impl fmt::Display for DataIntegrityErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIntegrityErrorKind::TotalOpCyclesIsZero => f.write_str("total op cycles is zero"),
        }
    }
}

/// One recorded integrity condition: a typed kind plus a human-readable
/// message with the offending values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrityError {
    pub kind: DataIntegrityErrorKind,
    pub message: String,
}

/// The per-chip integrity log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataIntegrityLog {
    errors: Vec<DataIntegrityError>,
}

impl DataIntegrityLog {
    /// Records a condition, at most once per kind. Augmentation passes may
    /// revisit the same totals; the log must not accumulate duplicates.
    pub fn record(&mut self, kind: DataIntegrityErrorKind, message: impl Into<String>) {
        if self.has(kind) {
            return;
        }
        self.errors.push(DataIntegrityError {
            kind,
            message: message.into(),
        });
    }

    /// Whether any condition of `kind` has been recorded.
    pub fn has(&self, kind: DataIntegrityErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind == kind)
    }

    /// All conditions of `kind`.
    pub fn by_kind(&self, kind: DataIntegrityErrorKind) -> Vec<&DataIntegrityError> {
        self.errors
            .iter()
            .filter(|error| error.kind == kind)
            .collect()
    }

    /// All recorded conditions, in recording order.
    pub fn errors(&self) -> &[DataIntegrityError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_once_per_kind() {
        let mut log = DataIntegrityLog::default();
        log.record(DataIntegrityErrorKind::TotalOpCyclesIsZero, "first");
        log.record(DataIntegrityErrorKind::TotalOpCyclesIsZero, "second");
        assert_eq!(log.errors().len(), 1);
        assert_eq!(log.errors()[0].message, "first");
        assert!(log.has(DataIntegrityErrorKind::TotalOpCyclesIsZero));
        assert_eq!(
            log.by_kind(DataIntegrityErrorKind::TotalOpCyclesIsZero).len(),
            1
        );
    }

    #[test]
    fn empty_log() {
        let log = DataIntegrityLog::default();
        assert!(log.is_empty());
        assert!(!log.has(DataIntegrityErrorKind::TotalOpCyclesIsZero));
    }
}
