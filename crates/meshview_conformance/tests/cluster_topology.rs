//! Tests for cluster assembly: reciprocal connections and tolerance of
//! over-provisioned descriptors.

use meshview_cluster::{Cluster, ClusterDescriptorDocument, DeviceDescriptorDocument};
use meshview_common::ChipId;
use serde_json::json;
use std::collections::BTreeMap;

fn chip(id: u32) -> ChipId {
    ChipId::from_raw(id)
}

fn four_chip_ring() -> ClusterDescriptorDocument {
    serde_json::from_value(json!({
        "chips": {
            "0": [0, 0, 0, 0],
            "1": [1, 0, 0, 0],
            "2": [1, 1, 0, 0],
            "3": [0, 1, 0, 0]
        },
        "ethernet_connections": [
            [{"chip": 0, "chan": 0}, {"chip": 1, "chan": 1}],
            [{"chip": 1, "chan": 0}, {"chip": 2, "chan": 1}],
            [{"chip": 2, "chan": 0}, {"chip": 3, "chan": 1}],
            [{"chip": 3, "chan": 0}, {"chip": 0, "chan": 1}]
        ],
        "chips_with_mmio": [0]
    }))
    .unwrap()
}

fn devices(ids: &[u32]) -> BTreeMap<ChipId, DeviceDescriptorDocument> {
    ids.iter()
        .map(|&id| {
            (
                chip(id),
                DeviceDescriptorDocument {
                    eth_cores: vec!["9-0".to_string(), "1-0".to_string()],
                },
            )
        })
        .collect()
}

#[test]
fn every_resolved_connection_is_recorded_on_both_ends() {
    let cluster = Cluster::from_descriptor(&four_chip_ring(), &devices(&[0, 1, 2, 3])).unwrap();
    assert_eq!(cluster.len(), 4);

    for member in cluster.chips() {
        // Ring topology: each chip connects to exactly two neighbors.
        assert_eq!(member.connected_chips().len(), 2);
        for (eth_core, other_id) in member.connected_chips() {
            // The local endpoint belongs to the chip recording it.
            assert!(cluster
                .chip(member.id)
                .unwrap()
                .eth_core_ids()
                .contains(eth_core));
            // The other end knows the way back.
            let other = cluster.chip(*other_id).unwrap();
            assert!(other
                .connected_chips()
                .values()
                .any(|back| *back == member.id));
        }
    }
}

#[test]
fn connections_through_unknown_chips_resolve_nowhere() {
    let doc: ClusterDescriptorDocument = serde_json::from_value(json!({
        "chips": {"0": [0, 0, 0, 0]},
        "ethernet_connections": [
            [{"chip": 0, "chan": 0}, {"chip": 6, "chan": 0}]
        ],
        "chips_with_mmio": []
    }))
    .unwrap();
    let cluster = Cluster::from_descriptor(&doc, &devices(&[0])).unwrap();
    let chip0 = cluster.chip(chip(0)).unwrap();
    assert!(chip0.connected_chips().is_empty());
}

#[test]
fn grid_extents_cover_the_largest_coordinates() {
    let cluster = Cluster::from_descriptor(&four_chip_ring(), &devices(&[0, 1, 2, 3])).unwrap();
    assert_eq!(cluster.total_cols(), 2);
    assert_eq!(cluster.total_rows(), 2);
    assert!(cluster.chip(chip(0)).unwrap().mmio);
    assert!(!cluster.chip(chip(2)).unwrap().mmio);
}
