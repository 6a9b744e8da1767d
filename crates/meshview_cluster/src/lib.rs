//! Cluster-level topology: chip-to-chip Ethernet connectivity.
//!
//! Independent of per-chip internals; the only shared vocabulary is
//! [`meshview_common::ChipId`]. Connections are held as maps from a chip's
//! local Ethernet core ID to the chip on the other end, built so that every
//! resolved connection is recorded reciprocally on both sides.

mod json;
mod topology;

pub use json::{ClusterDescriptorDocument, DeviceDescriptorDocument, EthEndpointJson};
pub use topology::{Cluster, ClusterChip, ClusterCoordinates, ClusterError};
