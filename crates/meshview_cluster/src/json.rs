//! Wire types for the cluster and device descriptor documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The cluster descriptor: chip coordinates, Ethernet connections, and the
/// MMIO-enabled chip set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterDescriptorDocument {
    /// Chip ID (as a JSON object key, hence a string) to its
    /// `[x, y, rack, shelf]` coordinate tuple.
    #[serde(default)]
    pub chips: BTreeMap<String, [u32; 4]>,
    /// Each connection is a pair of (chip, channel) endpoints.
    #[serde(default)]
    pub ethernet_connections: Vec<[EthEndpointJson; 2]>,
    #[serde(default)]
    pub chips_with_mmio: Vec<u32>,
}

/// One side of an Ethernet connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthEndpointJson {
    pub chip: u32,
    pub chan: u32,
}

/// The per-chip device descriptor, consulted for the chip's Ethernet core
/// IDs in channel order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDescriptorDocument {
    /// Ethernet core locations (`"<x>-<y>"`), indexed by channel.
    #[serde(default)]
    pub eth_cores: Vec<String>,
}
