//! The per-chip aggregate and its augmentation pipeline.
//!
//! [`GraphOnChip`] owns everything known about one (chip, epoch) pair:
//! compute nodes, network links, pipes, operations, queues, and the DRAM
//! channel topology. It is built by a sequence of augmentation passes, one
//! per source document, each taking the previous aggregate and producing a
//! more complete one. The pipeline is strictly additive: later passes add
//! detail but never invalidate identities established by earlier passes.

mod augment;
mod error;
mod graph_on_chip;
mod integrity;

pub mod json;

pub use error::ChipError;
pub use graph_on_chip::{Architecture, GraphOnChip, PipeSelection};
pub use integrity::{DataIntegrityError, DataIntegrityErrorKind, DataIntegrityLog};
