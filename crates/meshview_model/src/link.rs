//! Network links, pipe segments, and chip-level pipes.
//!
//! A [`NetworkLink`] is one directed wire of the on-chip fabric (NOC mesh
//! hop, NOC-to-AXI bridge, DRAM bank port, Ethernet or PCIe endpoint). Its
//! concrete kind is decided solely by the link's name; callers never pick a
//! kind themselves. Each link carries the [`PipeSegment`]s that traverse it,
//! and all segments sharing one pipe ID aggregate into one chip-level
//! [`Pipe`].

use meshview_common::{NodeUid, PipeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Every link-direction name the analyzer can emit, with its wire form.
///
/// The declaration order of the NOC names is the presentation order used
/// when listing a node's links (see [`noc_sort_order`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum LinkName {
    #[serde(rename = "noc0_link_in")]
    Noc0In,
    #[serde(rename = "noc0_link_out")]
    Noc0Out,
    #[serde(rename = "noc0_in_north")]
    Noc0NorthIn,
    #[serde(rename = "noc0_out_south")]
    Noc0SouthOut,
    #[serde(rename = "noc0_in_west")]
    Noc0WestIn,
    #[serde(rename = "noc0_out_east")]
    Noc0EastOut,
    #[serde(rename = "noc1_link_in")]
    Noc1In,
    #[serde(rename = "noc1_link_out")]
    Noc1Out,
    #[serde(rename = "noc1_out_west")]
    Noc1WestOut,
    #[serde(rename = "noc1_in_east")]
    Noc1EastIn,
    #[serde(rename = "noc1_in_south")]
    Noc1SouthIn,
    #[serde(rename = "noc1_out_north")]
    Noc1NorthOut,
    #[serde(rename = "noc0_noc2axi")]
    Noc0Noc2Axi,
    #[serde(rename = "noc1_noc2axi")]
    Noc1Noc2Axi,
    #[serde(rename = "dram_inout")]
    DramInout,
    #[serde(rename = "dram0_inout")]
    Dram0Inout,
    #[serde(rename = "dram1_inout")]
    Dram1Inout,
    #[serde(rename = "from_ethernet")]
    EthIn,
    #[serde(rename = "to_ethernet")]
    EthOut,
    #[serde(rename = "pcie_inout")]
    PcieInout,
}

impl LinkName {
    /// All NOC mesh link names, in presentation order.
    pub const NOC_NAMES: [LinkName; 12] = [
        LinkName::Noc0In,
        LinkName::Noc0Out,
        LinkName::Noc0NorthIn,
        LinkName::Noc0SouthOut,
        LinkName::Noc0WestIn,
        LinkName::Noc0EastOut,
        LinkName::Noc1In,
        LinkName::Noc1Out,
        LinkName::Noc1WestOut,
        LinkName::Noc1EastIn,
        LinkName::Noc1SouthIn,
        LinkName::Noc1NorthOut,
    ];

    /// The NOC link names that stay within the node itself (in/out pairs),
    /// as opposed to the mesh-facing directional links.
    pub const INTERNAL_NOC_NAMES: [LinkName; 4] = [
        LinkName::Noc0In,
        LinkName::Noc0Out,
        LinkName::Noc1In,
        LinkName::Noc1Out,
    ];

    /// Parses a link name from its wire form.
    ///
    /// An unrecognized name is a hard error: silently skipping a link would
    /// corrupt the chip's saturation totals.
    pub fn parse(name: &str) -> Result<Self, LinkError> {
        serde_json::from_value(serde_json::Value::String(name.to_string()))
            .map_err(|_| LinkError::UnknownLinkName(name.to_string()))
    }

    /// Returns the wire form of this name.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkName::Noc0In => "noc0_link_in",
            LinkName::Noc0Out => "noc0_link_out",
            LinkName::Noc0NorthIn => "noc0_in_north",
            LinkName::Noc0SouthOut => "noc0_out_south",
            LinkName::Noc0WestIn => "noc0_in_west",
            LinkName::Noc0EastOut => "noc0_out_east",
            LinkName::Noc1In => "noc1_link_in",
            LinkName::Noc1Out => "noc1_link_out",
            LinkName::Noc1WestOut => "noc1_out_west",
            LinkName::Noc1EastIn => "noc1_in_east",
            LinkName::Noc1SouthIn => "noc1_in_south",
            LinkName::Noc1NorthOut => "noc1_out_north",
            LinkName::Noc0Noc2Axi => "noc0_noc2axi",
            LinkName::Noc1Noc2Axi => "noc1_noc2axi",
            LinkName::DramInout => "dram_inout",
            LinkName::Dram0Inout => "dram0_inout",
            LinkName::Dram1Inout => "dram1_inout",
            LinkName::EthIn => "from_ethernet",
            LinkName::EthOut => "to_ethernet",
            LinkName::PcieInout => "pcie_inout",
        }
    }

    /// The concrete link kind, decided solely by the name.
    pub fn kind(self) -> LinkKind {
        match self {
            LinkName::Noc0In
            | LinkName::Noc0Out
            | LinkName::Noc0NorthIn
            | LinkName::Noc0SouthOut
            | LinkName::Noc0WestIn
            | LinkName::Noc0EastOut
            | LinkName::Noc1In
            | LinkName::Noc1Out
            | LinkName::Noc1WestOut
            | LinkName::Noc1EastIn
            | LinkName::Noc1SouthIn
            | LinkName::Noc1NorthOut => LinkKind::Noc,
            LinkName::Noc0Noc2Axi | LinkName::Noc1Noc2Axi => LinkKind::Noc2Axi,
            LinkName::DramInout | LinkName::Dram0Inout | LinkName::Dram1Inout => LinkKind::Dram,
            LinkName::EthIn | LinkName::EthOut => LinkKind::Ethernet,
            LinkName::PcieInout => LinkKind::Pcie,
        }
    }

    /// Which NOC this link belongs to, for NOC and NOC-to-AXI names.
    pub fn noc(self) -> Option<NocSelect> {
        match self.kind() {
            LinkKind::Noc | LinkKind::Noc2Axi => {
                if self.as_str().starts_with("noc0") {
                    Some(NocSelect::Noc0)
                } else {
                    Some(NocSelect::Noc1)
                }
            }
            _ => None,
        }
    }

    /// Which DRAM bank this link serves, for DRAM bank names.
    pub fn dram_bank(self) -> Option<DramBank> {
        match self {
            LinkName::Dram0Inout => Some(DramBank::Bank0),
            LinkName::DramInout | LinkName::Dram1Inout => Some(DramBank::Bank1),
            _ => None,
        }
    }
}

impl fmt::Display for LinkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The concrete variant of a network link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// An on-chip NOC mesh link.
    Noc,
    /// A NOC-to-AXI bridge link inside a DRAM subchannel.
    Noc2Axi,
    /// A DRAM bank port link.
    Dram,
    /// An off-chip Ethernet link.
    Ethernet,
    /// An off-chip PCIe link.
    Pcie,
}

/// Which of the two NOC fabrics a link belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NocSelect {
    Noc0,
    Noc1,
}

/// Which DRAM bank a bank link serves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DramBank {
    Bank0,
    Bank1,
}

/// Returns the presentation sort index for a NOC link name.
///
/// The table is a process-wide memoized constant, built on first access from
/// [`LinkName::NOC_NAMES`]. Names outside the NOC set sort after all NOC
/// names.
pub fn noc_sort_order(name: LinkName) -> usize {
    static ORDER: OnceLock<BTreeMap<LinkName, usize>> = OnceLock::new();
    let order = ORDER.get_or_init(|| {
        LinkName::NOC_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| (*name, index))
            .collect()
    });
    order.get(&name).copied().unwrap_or(usize::MAX)
}

/// Errors arising from link construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// A link name not present in the dispatch table.
    #[error("unknown network link name '{0}'")]
    UnknownLinkName(String),
}

/// The per-link payload of the placement document: occupancy counters and
/// the pipes mapped onto the link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkJson {
    /// Number of pipes occupying this link.
    #[serde(default)]
    pub num_occupants: u64,
    /// Total bytes moved over this link in the profiled window.
    #[serde(default)]
    pub total_data_in_bytes: f64,
    /// The link's maximum bandwidth.
    #[serde(default)]
    pub max_link_bw: f64,
    /// Pipe ID to that pipe's bandwidth share on this link. A `BTreeMap`
    /// keeps segment construction order deterministic.
    #[serde(default)]
    pub mapped_pipes: BTreeMap<String, f64>,
}

/// One directed occurrence of a pipe on one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeSegment {
    /// The pipe this segment belongs to; shared by all segments of the pipe.
    pub id: PipeId,
    /// This link's share of the pipe's bandwidth.
    pub bandwidth: f64,
    /// Bandwidth as a percentage of the link's total data. Defined as 0
    /// when the link moved no data, never NaN or infinite.
    pub bandwidth_use: f64,
    /// The name of the link this segment lives on.
    pub link_name: LinkName,
}

impl PipeSegment {
    /// Creates a segment, deriving the bandwidth-use percentage from the
    /// owning link's total data.
    pub fn new(id: PipeId, bandwidth: f64, link_name: LinkName, link_total_data: f64) -> Self {
        let bandwidth_use = if link_total_data > 0.0 && bandwidth.is_finite() {
            (bandwidth / link_total_data) * 100.0
        } else {
            0.0
        };
        Self {
            id,
            bandwidth,
            bandwidth_use,
            link_name,
        }
    }
}

/// A typed, directed link record with its traversing pipe segments.
///
/// Constructed once from the source link map; immutable afterwards except
/// for being read to generate congestion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkLink {
    /// Unique link ID within the chip.
    pub uid: String,
    /// The link-direction name.
    pub name: LinkName,
    /// The concrete variant, derived from the name.
    pub kind: LinkKind,
    /// Number of pipes occupying this link.
    pub num_occupants: u64,
    /// Total bytes moved over this link.
    pub total_data_bytes: f64,
    /// The link's maximum bandwidth.
    pub max_bandwidth: f64,
    /// The pipe segments traversing this link.
    pub pipe_segments: Vec<PipeSegment>,
}

impl NetworkLink {
    /// Builds a link from one entry of a source link map.
    ///
    /// The variant is decided by the name alone; segment order follows the
    /// source map's (sorted) pipe-ID order.
    pub fn from_json(name: LinkName, uid: impl Into<String>, json: &LinkJson) -> Self {
        let total_data_bytes = json.total_data_in_bytes;
        let pipe_segments = json
            .mapped_pipes
            .iter()
            .map(|(pipe_id, bandwidth)| {
                PipeSegment::new(PipeId::new(pipe_id), *bandwidth, name, total_data_bytes)
            })
            .collect();
        Self {
            uid: uid.into(),
            name,
            kind: name.kind(),
            num_occupants: json.num_occupants,
            total_data_bytes,
            max_bandwidth: json.max_link_bw,
            pipe_segments,
        }
    }

    /// Snapshots this link into the initial congestion state consumed by
    /// the UI's link-state store.
    pub fn generate_initial_state(&self) -> LinkState {
        LinkState {
            id: self.uid.clone(),
            total_data_bytes: self.total_data_bytes,
            bytes_per_cycle: 0.0,
            saturation: 0.0,
            max_bandwidth: self.max_bandwidth,
            kind: self.kind,
        }
    }
}

/// Per-link congestion state seeded into the UI state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkState {
    pub id: String,
    pub total_data_bytes: f64,
    pub bytes_per_cycle: f64,
    pub saturation: f64,
    pub max_bandwidth: f64,
    pub kind: LinkKind,
}

/// The chip-level aggregate of every segment sharing one pipe ID.
///
/// Built lazily by folding node link segments into a per-ID map during
/// ingestion, then enriched with producer/consumer data once operation and
/// queue operands are known. A pipe with no producer or consumer recorded is
/// valid; that data may simply not be available yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipe {
    /// The pipe's stable ID.
    pub id: PipeId,
    /// Every segment of this pipe, one per traversed link occurrence.
    pub segments: Vec<PipeSegment>,
    /// UIDs of the nodes this pipe touches, without duplicates.
    pub nodes: Vec<NodeUid>,
    /// Cores feeding this pipe, recorded append-once.
    pub producer_cores: Vec<NodeUid>,
    /// Cores consuming this pipe, recorded append-once.
    pub consumer_cores: Vec<NodeUid>,
    /// Name of the output-side operand producing into this pipe.
    pub producer_core_output_operand: Option<String>,
    /// Name of the input-side operand consuming from this pipe.
    pub consumer_core_input_operand: Option<String>,
}

impl Pipe {
    /// Creates an empty pipe for the given ID.
    pub fn new(id: PipeId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Records a node as touched by this pipe, skipping duplicates.
    pub fn add_node(&mut self, uid: NodeUid) {
        if !self.nodes.contains(&uid) {
            self.nodes.push(uid);
        }
    }

    /// Records a producing core, append-once.
    pub fn add_producer_core(&mut self, uid: NodeUid) -> bool {
        if self.producer_cores.contains(&uid) {
            return false;
        }
        self.producer_cores.push(uid);
        true
    }

    /// Records a consuming core, append-once.
    pub fn add_consumer_core(&mut self, uid: NodeUid) -> bool {
        if self.consumer_cores.contains(&uid) {
            return false;
        }
        self.consumer_cores.push(uid);
        true
    }
}
