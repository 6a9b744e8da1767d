//! Loading a full analyzer output folder into chip aggregates.
//!
//! The analyzer writes one folder per run. Per (chip, temporal epoch) pair
//! this crate locates the source documents, runs the augmentation passes
//! strictly in order, and publishes the aggregate only once every pass has
//! succeeded. A failed pair is discarded wholesale; it never corrupts
//! other pairs loaded from the same folder.

mod error;
mod layout;
mod load;

pub use error::LoadError;
pub use layout::{discover_pairs, DatasetKey};
pub use load::{load_all, load_cluster, load_graph_on_chip, LoadedChip, LoadedDataset};
