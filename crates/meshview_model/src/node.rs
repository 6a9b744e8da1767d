//! Compute-grid nodes.

use crate::link::{noc_sort_order, LinkKind, LinkName, NetworkLink};
use meshview_common::{ChipId, NodeLocation, NodeUid, PipeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The functional type of one grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A cell with no known function.
    #[default]
    None,
    /// A routing-only cell.
    Router,
    /// A compute core.
    Core,
    /// A DRAM bank cell.
    Dram,
    /// An Ethernet endpoint cell.
    #[serde(rename = "eth")]
    Ethernet,
    /// A PCIe endpoint cell.
    Pcie,
}

impl NodeType {
    /// Parses the placement document's node type string. Unrecognized
    /// strings map to [`NodeType::None`] rather than failing; the document
    /// may describe cell types newer than this tool.
    pub fn parse(s: &str) -> Self {
        match s {
            "router" => NodeType::Router,
            "core" => NodeType::Core,
            "dram" => NodeType::Dram,
            "eth" => NodeType::Ethernet,
            "pcie" => NodeType::Pcie,
            _ => NodeType::None,
        }
    }

    /// Single-character grid label for this type ("hc" for harvested cores).
    pub fn label(self, harvested: bool) -> &'static str {
        match self {
            NodeType::Core if harvested => "hc",
            NodeType::Core => "c",
            NodeType::Router => "r",
            NodeType::Dram => "d",
            NodeType::Ethernet => "e",
            NodeType::Pcie => "p",
            NodeType::None => "",
        }
    }
}

/// One cell of a chip's compute grid.
///
/// Created once during placement ingestion. Later augmentation passes only
/// attach performance results and pipe/queue back-references; the node is
/// never destroyed except by discarding the whole aggregate. All
/// back-references are held as IDs and resolved through the chip
/// aggregate's maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeNode {
    /// The node's globally unique ID (chip + location).
    pub uid: NodeUid,
    /// The cell's functional type.
    pub node_type: NodeType,
    /// Op cycles reported for this cell.
    pub op_cycles: u64,
    /// Whether this core was harvested (fused off) on the physical part.
    pub harvested: bool,
    /// DRAM channel this cell belongs to, if it is a DRAM cell.
    pub dram_channel_id: Option<u32>,
    /// DRAM subchannel index; only meaningful alongside `dram_channel_id`.
    pub dram_subchannel_id: u32,
    /// NOC-routable links (mesh and NOC-to-AXI), keyed by direction name.
    pub links: BTreeMap<LinkName, NetworkLink>,
    /// Off-chip-facing links (Ethernet, PCIe), kept out of the NOC map.
    pub internal_links: BTreeMap<LinkName, NetworkLink>,
    /// IDs of all pipes touching this node.
    pub pipes: Vec<PipeId>,
    /// IDs of pipes this node produces into.
    pub producer_pipes: Vec<PipeId>,
    /// IDs of pipes this node consumes from.
    pub consumer_pipes: Vec<PipeId>,
    /// Names of queues allocated on this node's DRAM channel.
    pub queues: Vec<String>,
    /// Name of the operation this core implements. Set once; later
    /// assignment attempts are no-ops.
    operation: Option<String>,
    /// Per-core performance measurements, attached by the perf pass.
    pub perf: Option<crate::perf::MeasurementDetails>,
}

impl ComputeNode {
    /// Creates an empty node of the given type at `uid`.
    pub fn new(uid: NodeUid, node_type: NodeType) -> Self {
        Self {
            uid,
            node_type,
            op_cycles: 0,
            harvested: false,
            dram_channel_id: None,
            dram_subchannel_id: 0,
            links: BTreeMap::new(),
            internal_links: BTreeMap::new(),
            pipes: Vec::new(),
            producer_pipes: Vec::new(),
            consumer_pipes: Vec::new(),
            queues: Vec::new(),
            operation: None,
            perf: None,
        }
    }

    /// The chip this node belongs to.
    pub fn chip(&self) -> ChipId {
        self.uid.chip
    }

    /// The node's grid location.
    pub fn loc(&self) -> NodeLocation {
        self.uid.location
    }

    /// The name of the operation this core implements, if any.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Sets the operation back-reference.
    ///
    /// A core is produced by exactly one operation for its lifetime: once
    /// set, the reference is immutable and later calls return `false`
    /// without changing anything.
    pub fn set_operation(&mut self, name: impl Into<String>) -> bool {
        if self.operation.is_some() {
            return false;
        }
        self.operation = Some(name.into());
        true
    }

    /// Files a constructed link into the NOC map or the internal (off-chip)
    /// map based on its variant. DRAM bank links belong to the channel
    /// topology, not to nodes, and are dropped here.
    pub fn insert_link(&mut self, link: NetworkLink) {
        match link.kind {
            LinkKind::Noc | LinkKind::Noc2Axi => {
                self.links.insert(link.name, link);
            }
            LinkKind::Ethernet | LinkKind::Pcie => {
                self.internal_links.insert(link.name, link);
            }
            LinkKind::Dram => {
                log::debug!(
                    "dropping dram bank link '{}' declared on node {}",
                    link.name,
                    self.uid
                );
            }
        }
    }

    /// The node's NOC links in presentation order.
    pub fn noc_links_ordered(&self) -> Vec<&NetworkLink> {
        let mut links: Vec<&NetworkLink> = self.links.values().collect();
        links.sort_by_key(|link| noc_sort_order(link.name));
        links
    }

    /// The node's node-internal and off-chip links in presentation order:
    /// in/out NOC pairs and bridge links first, then Ethernet/PCIe links.
    pub fn internal_links_ordered(&self) -> Vec<&NetworkLink> {
        let mut links: Vec<&NetworkLink> = self
            .links
            .values()
            .filter(|link| {
                LinkName::INTERNAL_NOC_NAMES.contains(&link.name)
                    || link.kind == LinkKind::Noc2Axi
            })
            .collect();
        links.sort_by_key(|link| noc_sort_order(link.name));
        links.extend(self.internal_links.values());
        links
    }

    /// IDs of every pipe mapped onto any of this node's links.
    pub fn pipe_ids(&self) -> Vec<PipeId> {
        self.links
            .values()
            .chain(self.internal_links.values())
            .flat_map(|link| link.pipe_segments.iter().map(|segment| segment.id.clone()))
            .collect()
    }

    /// Pipe IDs mapped onto one NOC direction.
    pub fn pipe_ids_for_direction(&self, direction: LinkName) -> Vec<PipeId> {
        self.links
            .get(&direction)
            .map(|link| {
                link.pipe_segments
                    .iter()
                    .map(|segment| segment.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Records a pipe as touching this node, append-once.
    pub fn add_pipe(&mut self, id: PipeId) {
        if !self.pipes.contains(&id) {
            self.pipes.push(id);
        }
    }

    /// Records a pipe as produced by this node, append-once.
    pub fn add_producer_pipe(&mut self, id: PipeId) {
        if !self.producer_pipes.contains(&id) {
            self.producer_pipes.push(id);
        }
    }

    /// Records a pipe as consumed by this node, append-once.
    pub fn add_consumer_pipe(&mut self, id: PipeId) {
        if !self.consumer_pipes.contains(&id) {
            self.consumer_pipes.push(id);
        }
    }

    /// Registers a queue allocated on this node's DRAM channel, append-once.
    pub fn add_queue(&mut self, name: &str) {
        if !self.queues.iter().any(|queue| queue == name) {
            self.queues.push(name.to_string());
        }
    }

    /// The node's grid label.
    pub fn label(&self) -> &'static str {
        self.node_type.label(self.harvested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkJson;
    use std::collections::BTreeMap as Map;

    fn uid(x: u32, y: u32) -> NodeUid {
        NodeUid::new(ChipId::from_raw(0), NodeLocation::new(x, y))
    }

    fn link(name: LinkName, pipes: &[&str]) -> NetworkLink {
        let mapped_pipes: Map<String, f64> =
            pipes.iter().map(|id| (id.to_string(), 10.0)).collect();
        NetworkLink::from_json(
            name,
            format!("test-{name}"),
            &LinkJson {
                num_occupants: pipes.len() as u64,
                total_data_in_bytes: 100.0,
                max_link_bw: 50.0,
                mapped_pipes,
            },
        )
    }

    #[test]
    fn node_type_parsing() {
        assert_eq!(NodeType::parse("core"), NodeType::Core);
        assert_eq!(NodeType::parse("eth"), NodeType::Ethernet);
        assert_eq!(NodeType::parse("mystery"), NodeType::None);
    }

    #[test]
    fn operation_reference_is_set_once() {
        let mut node = ComputeNode::new(uid(0, 0), NodeType::Core);
        assert!(node.set_operation("matmul"));
        assert!(!node.set_operation("other"));
        assert_eq!(node.operation(), Some("matmul"));
    }

    #[test]
    fn link_partitioning() {
        let mut node = ComputeNode::new(uid(1, 1), NodeType::Ethernet);
        node.insert_link(link(LinkName::Noc0In, &[]));
        node.insert_link(link(LinkName::Noc0Noc2Axi, &[]));
        node.insert_link(link(LinkName::EthIn, &[]));
        node.insert_link(link(LinkName::PcieInout, &[]));
        node.insert_link(link(LinkName::DramInout, &[]));
        assert_eq!(node.links.len(), 2);
        assert_eq!(node.internal_links.len(), 2);
        assert!(node.links.contains_key(&LinkName::Noc0Noc2Axi));
        assert!(node.internal_links.contains_key(&LinkName::EthIn));
    }

    #[test]
    fn noc_links_presentation_order() {
        let mut node = ComputeNode::new(uid(0, 0), NodeType::Router);
        node.insert_link(link(LinkName::Noc1NorthOut, &[]));
        node.insert_link(link(LinkName::Noc0In, &[]));
        node.insert_link(link(LinkName::Noc0EastOut, &[]));
        let ordered: Vec<LinkName> = node
            .noc_links_ordered()
            .iter()
            .map(|link| link.name)
            .collect();
        assert_eq!(
            ordered,
            vec![LinkName::Noc0In, LinkName::Noc0EastOut, LinkName::Noc1NorthOut]
        );
    }

    #[test]
    fn internal_links_include_in_out_pairs_and_offchip() {
        let mut node = ComputeNode::new(uid(0, 0), NodeType::Ethernet);
        node.insert_link(link(LinkName::Noc0In, &[]));
        node.insert_link(link(LinkName::Noc0EastOut, &[]));
        node.insert_link(link(LinkName::EthOut, &[]));
        let names: Vec<LinkName> = node
            .internal_links_ordered()
            .iter()
            .map(|link| link.name)
            .collect();
        assert_eq!(names, vec![LinkName::Noc0In, LinkName::EthOut]);
    }

    #[test]
    fn pipe_ids_cover_both_link_maps() {
        let mut node = ComputeNode::new(uid(2, 2), NodeType::Core);
        node.insert_link(link(LinkName::Noc0Out, &["p1", "p2"]));
        node.insert_link(link(LinkName::EthIn, &["p3"]));
        let mut ids = node.pipe_ids();
        ids.sort();
        assert_eq!(ids, vec!["p1".into(), "p2".into(), "p3".into()]);
        assert_eq!(
            node.pipe_ids_for_direction(LinkName::Noc0Out),
            vec![PipeId::new("p1"), PipeId::new("p2")]
        );
        assert!(node.pipe_ids_for_direction(LinkName::Noc1Out).is_empty());
    }

    #[test]
    fn labels() {
        assert_eq!(ComputeNode::new(uid(0, 0), NodeType::Core).label(), "c");
        let mut harvested = ComputeNode::new(uid(0, 1), NodeType::Core);
        harvested.harvested = true;
        assert_eq!(harvested.label(), "hc");
        assert_eq!(ComputeNode::new(uid(0, 2), NodeType::None).label(), "");
    }

    #[test]
    fn append_once_back_references() {
        let mut node = ComputeNode::new(uid(0, 0), NodeType::Core);
        node.add_pipe(PipeId::new("p1"));
        node.add_pipe(PipeId::new("p1"));
        node.add_queue("q0");
        node.add_queue("q0");
        assert_eq!(node.pipes.len(), 1);
        assert_eq!(node.queues.len(), 1);
    }
}
