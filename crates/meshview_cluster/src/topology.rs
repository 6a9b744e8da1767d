//! Cluster assembly from descriptor documents.

use crate::json::{ClusterDescriptorDocument, DeviceDescriptorDocument};
use meshview_common::ChipId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A chip's position in the cluster: grid cell plus rack/shelf placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCoordinates {
    pub x: u32,
    pub y: u32,
    pub rack: u32,
    pub shelf: u32,
}

impl From<[u32; 4]> for ClusterCoordinates {
    fn from([x, y, rack, shelf]: [u32; 4]) -> Self {
        Self { x, y, rack, shelf }
    }
}

/// Errors raised during cluster assembly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// A chip key in the descriptor's coordinate table is not numeric.
    #[error("malformed chip id '{0}' in cluster descriptor")]
    MalformedChipId(String),
}

/// One chip of the cluster.
///
/// Ethernet core IDs carry the chip-ID prefix (`"<chip>-<x>-<y>"`) so they
/// are unique cluster-wide. Connections are keyed by local Ethernet core ID
/// and point at the chip on the other end; per-chip internals stay in the
/// chip aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterChip {
    pub id: ChipId,
    pub coordinates: ClusterCoordinates,
    /// Whether the host reaches this chip directly over PCIe.
    pub mmio: bool,
    eth_core_ids: Vec<String>,
    connected_chips: BTreeMap<String, ChipId>,
}

impl ClusterChip {
    /// This chip's Ethernet core IDs, in channel order.
    pub fn eth_core_ids(&self) -> &[String] {
        &self.eth_core_ids
    }

    /// The chip on the other end of the given local Ethernet core.
    pub fn connected_chip(&self, eth_core_id: &str) -> Option<ChipId> {
        self.connected_chips.get(eth_core_id).copied()
    }

    /// All connections, keyed by local Ethernet core ID.
    pub fn connected_chips(&self) -> &BTreeMap<String, ChipId> {
        &self.connected_chips
    }

    fn eth_core_id_for_channel(&self, channel: u32) -> Option<&String> {
        self.eth_core_ids.get(channel as usize)
    }
}

/// The assembled cluster topology.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cluster {
    chips: BTreeMap<ChipId, ClusterChip>,
    total_cols: u32,
    total_rows: u32,
}

impl Cluster {
    /// Assembles the cluster from its descriptor plus one device descriptor
    /// per chip (for the Ethernet core orderings).
    ///
    /// Connections whose endpoints reference a chip not in the coordinate
    /// table, or a channel beyond the chip's Ethernet core list, are
    /// tolerated as absent: descriptors are routinely generated for a
    /// larger topology than the run exercised. Every connection that does
    /// resolve is recorded on both chips.
    pub fn from_descriptor(
        doc: &ClusterDescriptorDocument,
        devices: &BTreeMap<ChipId, DeviceDescriptorDocument>,
    ) -> Result<Cluster, ClusterError> {
        let mut cluster = Cluster::default();

        for (raw_id, coords) in &doc.chips {
            let id = raw_id
                .parse::<u32>()
                .map(ChipId::from_raw)
                .map_err(|_| ClusterError::MalformedChipId(raw_id.clone()))?;
            let eth_core_ids = match devices.get(&id) {
                Some(device) => device
                    .eth_cores
                    .iter()
                    .map(|core| format!("{id}-{core}"))
                    .collect(),
                None => {
                    log::debug!("no device descriptor for chip {id}; no eth cores known");
                    Vec::new()
                }
            };
            let coordinates = ClusterCoordinates::from(*coords);
            cluster.total_cols = cluster.total_cols.max(coordinates.x + 1);
            cluster.total_rows = cluster.total_rows.max(coordinates.y + 1);
            cluster.chips.insert(
                id,
                ClusterChip {
                    id,
                    coordinates,
                    mmio: doc.chips_with_mmio.contains(&id.as_raw()),
                    eth_core_ids,
                    connected_chips: BTreeMap::new(),
                },
            );
        }

        for [a, b] in &doc.ethernet_connections {
            let a_id = ChipId::from_raw(a.chip);
            let b_id = ChipId::from_raw(b.chip);
            let resolved = {
                let (Some(chip_a), Some(chip_b)) =
                    (cluster.chips.get(&a_id), cluster.chips.get(&b_id))
                else {
                    log::debug!(
                        "ethernet connection {}:{} <-> {}:{} references a chip outside the cluster",
                        a.chip, a.chan, b.chip, b.chan
                    );
                    continue;
                };
                match (
                    chip_a.eth_core_id_for_channel(a.chan),
                    chip_b.eth_core_id_for_channel(b.chan),
                ) {
                    (Some(a_core), Some(b_core)) => Some((a_core.clone(), b_core.clone())),
                    _ => {
                        log::debug!(
                            "ethernet connection {}:{} <-> {}:{} references an unknown channel",
                            a.chip, a.chan, b.chip, b.chan
                        );
                        None
                    }
                }
            };
            let Some((a_core, b_core)) = resolved else {
                continue;
            };
            if let Some(chip_a) = cluster.chips.get_mut(&a_id) {
                chip_a.connected_chips.insert(a_core, b_id);
            }
            if let Some(chip_b) = cluster.chips.get_mut(&b_id) {
                chip_b.connected_chips.insert(b_core, a_id);
            }
        }

        Ok(cluster)
    }

    /// The cluster's chips, in ID order.
    pub fn chips(&self) -> impl Iterator<Item = &ClusterChip> {
        self.chips.values()
    }

    pub fn chip(&self, id: ChipId) -> Option<&ClusterChip> {
        self.chips.get(&id)
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Cluster-grid width, from the largest chip x coordinate.
    pub fn total_cols(&self) -> u32 {
        self.total_cols
    }

    /// Cluster-grid height, from the largest chip y coordinate.
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> ClusterDescriptorDocument {
        serde_json::from_value(json!({
            "chips": {
                "0": [0, 0, 0, 0],
                "1": [1, 0, 0, 0]
            },
            "ethernet_connections": [
                [{"chip": 0, "chan": 0}, {"chip": 1, "chan": 1}],
                [{"chip": 0, "chan": 1}, {"chip": 7, "chan": 0}],
                [{"chip": 0, "chan": 9}, {"chip": 1, "chan": 0}]
            ],
            "chips_with_mmio": [0]
        }))
        .unwrap()
    }

    fn devices() -> BTreeMap<ChipId, DeviceDescriptorDocument> {
        [
            (
                ChipId::from_raw(0),
                DeviceDescriptorDocument {
                    eth_cores: vec!["9-0".to_string(), "1-0".to_string()],
                },
            ),
            (
                ChipId::from_raw(1),
                DeviceDescriptorDocument {
                    eth_cores: vec!["9-0".to_string(), "1-0".to_string()],
                },
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn connections_are_reciprocal() {
        let cluster = Cluster::from_descriptor(&descriptor(), &devices()).unwrap();
        let chip0 = cluster.chip(ChipId::from_raw(0)).unwrap();
        let chip1 = cluster.chip(ChipId::from_raw(1)).unwrap();
        assert_eq!(chip0.connected_chip("0-9-0"), Some(ChipId::from_raw(1)));
        assert_eq!(chip1.connected_chip("1-1-0"), Some(ChipId::from_raw(0)));
    }

    #[test]
    fn out_of_range_endpoints_are_tolerated() {
        let cluster = Cluster::from_descriptor(&descriptor(), &devices()).unwrap();
        let chip0 = cluster.chip(ChipId::from_raw(0)).unwrap();
        // The chip-7 connection and the chan-9 connection both vanish,
        // leaving only the first one.
        assert_eq!(chip0.connected_chips().len(), 1);
        let chip1 = cluster.chip(ChipId::from_raw(1)).unwrap();
        assert_eq!(chip1.connected_chips().len(), 1);
    }

    #[test]
    fn eth_core_ids_carry_chip_prefix() {
        let cluster = Cluster::from_descriptor(&descriptor(), &devices()).unwrap();
        let chip1 = cluster.chip(ChipId::from_raw(1)).unwrap();
        assert_eq!(chip1.eth_core_ids(), &["1-9-0", "1-1-0"]);
    }

    #[test]
    fn mmio_flag_and_extents() {
        let cluster = Cluster::from_descriptor(&descriptor(), &devices()).unwrap();
        assert!(cluster.chip(ChipId::from_raw(0)).unwrap().mmio);
        assert!(!cluster.chip(ChipId::from_raw(1)).unwrap().mmio);
        assert_eq!(cluster.total_cols(), 2);
        assert_eq!(cluster.total_rows(), 1);
        assert_eq!(cluster.len(), 2);
    }

    #[test]
    fn malformed_chip_key_fails() {
        let doc: ClusterDescriptorDocument = serde_json::from_value(json!({
            "chips": {"not_a_number": [0, 0, 0, 0]}
        }))
        .unwrap();
        assert_eq!(
            Cluster::from_descriptor(&doc, &BTreeMap::new()).unwrap_err(),
            ClusterError::MalformedChipId("not_a_number".into())
        );
    }

    #[test]
    fn missing_device_descriptor_means_no_eth_cores() {
        let cluster = Cluster::from_descriptor(&descriptor(), &BTreeMap::new()).unwrap();
        let chip0 = cluster.chip(ChipId::from_raw(0)).unwrap();
        assert!(chip0.eth_core_ids().is_empty());
        assert!(chip0.connected_chips().is_empty());
    }
}
