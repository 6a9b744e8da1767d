//! Loader errors, carrying the originating file for user-facing reports.

use meshview_chip::ChipError;
use meshview_cluster::ClusterError;
use std::path::PathBuf;

/// A failure while loading one analyzer output folder.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An augmentation pass rejected a document; the aggregate being built
    /// for this pair was discarded.
    #[error("failed to ingest {path}: {source}")]
    Chip {
        path: PathBuf,
        #[source]
        source: ChipError,
    },

    #[error("failed to assemble cluster from {path}: {source}")]
    Cluster {
        path: PathBuf,
        #[source]
        source: ClusterError,
    },

    /// No placement document matched the requested (chip, epoch) pair.
    #[error("no netlist analyzer output for chip {chip} epoch {epoch} under {folder}")]
    NetlistNotFound {
        chip: u32,
        epoch: u32,
        folder: PathBuf,
    },
}
