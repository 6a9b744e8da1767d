//! The per-chip aggregate.

use crate::error::ChipError;
use crate::integrity::DataIntegrityLog;
use meshview_common::{ChipId, NodeUid, PipeId};
use meshview_model::{ComputeNode, DramChannel, GraphVertex, LinkKind, NetworkLink, Pipe, PipeSegment};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// The chip generation a dataset was produced on, parsed from the
/// placement document's architecture string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Architecture {
    #[default]
    None,
    Grayskull,
    Wormhole,
}

impl Architecture {
    /// Parses the architecture tag. The analyzer writes variants like
    /// `"grayskull"` or `"wormhole_b0"`; matching is by substring, and an
    /// unrecognized string maps to [`Architecture::None`].
    pub fn parse(arch: &str) -> Self {
        let arch = arch.to_ascii_lowercase();
        if arch.contains("grayskull") {
            Architecture::Grayskull
        } else if arch.contains("wormhole") {
            Architecture::Wormhole
        } else {
            Architecture::None
        }
    }
}

/// One entry of the UI's initial pipe-selection state: every pipe starts
/// unselected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeSelection {
    pub id: PipeId,
    pub selected: bool,
}

/// Everything known about one (chip, epoch) pair.
///
/// Owns the node, operation, queue, and pipe maps plus the DRAM channel
/// topology and the chip-level totals. All cross-references between these
/// entities are string/UID keys resolved through the maps here. Built and
/// enriched exclusively by the augmentation passes in this crate; the
/// public surface is read-only.
#[derive(Debug, Clone)]
pub struct GraphOnChip {
    pub(crate) chip_id: ChipId,
    pub(crate) architecture: Architecture,
    pub(crate) total_rows: u32,
    pub(crate) total_cols: u32,
    pub(crate) slowest_op_cycles: u64,
    pub(crate) bw_limited_op_cycles: u64,
    /// Running maximum of `bw_limited_factor` across every attached perf
    /// record. Never reset to a smaller value by a later pass.
    pub(crate) max_bw_limited_factor: f64,
    pub(crate) nodes: BTreeMap<NodeUid, ComputeNode>,
    pub(crate) operations: BTreeMap<String, GraphVertex>,
    pub(crate) queues: BTreeMap<String, GraphVertex>,
    pub(crate) pipes: BTreeMap<PipeId, Pipe>,
    pub(crate) dram_channels: Vec<DramChannel>,
    /// DRAM channel ID to the nodes on that channel, for queue placement.
    pub(crate) nodes_by_channel: BTreeMap<u32, Vec<NodeUid>>,
    pub(crate) integrity: DataIntegrityLog,
    pub(crate) unique_segments: OnceLock<Vec<PipeSegment>>,
}

impl GraphOnChip {
    pub(crate) fn empty(chip_id: ChipId) -> Self {
        Self {
            chip_id,
            architecture: Architecture::None,
            total_rows: 0,
            total_cols: 0,
            slowest_op_cycles: 0,
            bw_limited_op_cycles: 0,
            max_bw_limited_factor: 0.0,
            nodes: BTreeMap::new(),
            operations: BTreeMap::new(),
            queues: BTreeMap::new(),
            pipes: BTreeMap::new(),
            dram_channels: Vec::new(),
            nodes_by_channel: BTreeMap::new(),
            integrity: DataIntegrityLog::default(),
            unique_segments: OnceLock::new(),
        }
    }

    /// The chip this aggregate describes. Immutable for its lifetime.
    pub fn chip_id(&self) -> ChipId {
        self.chip_id
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Grid height in rows.
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// Grid width in columns.
    pub fn total_cols(&self) -> u32 {
        self.total_cols
    }

    pub fn slowest_op_cycles(&self) -> u64 {
        self.slowest_op_cycles
    }

    pub fn bw_limited_op_cycles(&self) -> u64 {
        self.bw_limited_op_cycles
    }

    /// The chip's total op cycles, always the minimum of the slowest and
    /// bandwidth-limited cycle counts. A zero value is recorded in the
    /// integrity log at construction time.
    pub fn total_op_cycles(&self) -> u64 {
        self.slowest_op_cycles.min(self.bw_limited_op_cycles)
    }

    pub fn max_bw_limited_factor(&self) -> f64 {
        self.max_bw_limited_factor
    }

    /// The recorded data-integrity conditions.
    pub fn integrity(&self) -> &DataIntegrityLog {
        &self.integrity
    }

    /// Looks up a node that must exist.
    pub fn node(&self, uid: NodeUid) -> Result<&ComputeNode, ChipError> {
        self.nodes.get(&uid).ok_or(ChipError::UnknownNode(uid))
    }

    /// Looks up a node that may be absent.
    pub fn try_node(&self, uid: NodeUid) -> Option<&ComputeNode> {
        self.nodes.get(&uid)
    }

    /// All nodes, in row-major order.
    pub fn nodes(&self) -> impl Iterator<Item = &ComputeNode> {
        self.nodes.values()
    }

    /// Looks up an operation that must exist.
    pub fn operation(&self, name: &str) -> Result<&GraphVertex, ChipError> {
        self.operations
            .get(name)
            .ok_or_else(|| ChipError::UnknownOperation(name.to_string()))
    }

    pub fn try_operation(&self, name: &str) -> Option<&GraphVertex> {
        self.operations.get(name)
    }

    /// All operations, in name order.
    pub fn operations(&self) -> impl Iterator<Item = &GraphVertex> {
        self.operations.values()
    }

    /// Looks up a queue that must exist.
    pub fn queue(&self, name: &str) -> Result<&GraphVertex, ChipError> {
        self.queues
            .get(name)
            .ok_or_else(|| ChipError::UnknownQueue(name.to_string()))
    }

    pub fn try_queue(&self, name: &str) -> Option<&GraphVertex> {
        self.queues.get(name)
    }

    /// All queues, in name order.
    pub fn queues(&self) -> impl Iterator<Item = &GraphVertex> {
        self.queues.values()
    }

    /// Looks up a pipe that must exist.
    pub fn pipe(&self, id: &PipeId) -> Result<&Pipe, ChipError> {
        self.pipes
            .get(id)
            .ok_or_else(|| ChipError::UnknownPipe(id.clone()))
    }

    pub fn try_pipe(&self, id: &PipeId) -> Option<&Pipe> {
        self.pipes.get(id)
    }

    /// All pipes, in ID order.
    pub fn pipes(&self) -> impl Iterator<Item = &Pipe> {
        self.pipes.values()
    }

    pub fn has_pipes(&self) -> bool {
        !self.pipes.is_empty()
    }

    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    pub fn has_queues(&self) -> bool {
        !self.queues.is_empty()
    }

    /// UIDs of the nodes a pipe touches.
    pub fn nodes_for_pipe(&self, id: &PipeId) -> Result<&[NodeUid], ChipError> {
        self.pipe(id).map(|pipe| pipe.nodes.as_slice())
    }

    /// The nodes on one DRAM channel, empty if the channel is unknown.
    pub fn nodes_for_channel(&self, channel: u32) -> &[NodeUid] {
        self.nodes_by_channel
            .get(&channel)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The chip's DRAM channels, in document order.
    pub fn dram_channels(&self) -> &[DramChannel] {
        &self.dram_channels
    }

    /// Every link on the chip: node NOC and off-chip links plus the DRAM
    /// channels' bank and subchannel links.
    pub fn all_links(&self) -> Vec<&NetworkLink> {
        let mut links: Vec<&NetworkLink> = Vec::new();
        for node in self.nodes.values() {
            links.extend(node.links.values());
            links.extend(node.internal_links.values());
        }
        for channel in &self.dram_channels {
            links.extend(channel.links.iter());
            for subchannel in &channel.subchannels {
                links.extend(subchannel.links.iter());
            }
        }
        links
    }

    fn pipes_on_link_kind(&self, kind: LinkKind) -> Vec<PipeId> {
        let ids: BTreeSet<PipeId> = self
            .all_links()
            .into_iter()
            .filter(|link| link.kind == kind)
            .flat_map(|link| link.pipe_segments.iter().map(|segment| segment.id.clone()))
            .collect();
        ids.into_iter().collect()
    }

    /// IDs of pipes crossing any Ethernet link, sorted.
    pub fn ethernet_pipes(&self) -> Vec<PipeId> {
        self.pipes_on_link_kind(LinkKind::Ethernet)
    }

    /// IDs of pipes crossing any PCIe link, sorted.
    pub fn pcie_pipes(&self) -> Vec<PipeId> {
        self.pipes_on_link_kind(LinkKind::Pcie)
    }

    /// Every pipe segment on the chip, sorted by pipe ID. Computed on first
    /// access and cached; the link set is immutable once ingested.
    pub fn unique_pipe_segments(&self) -> &[PipeSegment] {
        self.unique_segments.get_or_init(|| {
            let mut segments: Vec<PipeSegment> = self
                .all_links()
                .into_iter()
                .flat_map(|link| link.pipe_segments.iter().cloned())
                .collect();
            segments.sort_by(|a, b| a.id.cmp(&b.id));
            segments
        })
    }

    /// Snapshots every pipe ID into the unselected-by-default list the UI's
    /// selection store seeds itself from.
    pub fn generate_initial_pipe_selection(&self) -> Vec<PipeSelection> {
        self.pipes
            .keys()
            .map(|id| PipeSelection {
                id: id.clone(),
                selected: false,
            })
            .collect()
    }
}
