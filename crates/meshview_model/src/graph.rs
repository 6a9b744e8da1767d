//! Dataflow-graph vertices: operations and queues.
//!
//! The dataflow graph is a directed graph of operands, where each operand
//! is either an operation (a compute kernel backed by one or more cores) or
//! a queue (a data buffer). Both share the same bookkeeping (input/output
//! operand lists, per-core pipe-ID maps) with a payload carrying what is
//! specific to each kind. Edges are held as [`OperandRef`]s (name + kind),
//! resolved through the chip aggregate's vertex maps.

use crate::node::NodeType;
use crate::perf::OpPerfDetails;
use meshview_common::{ChipId, NodeUid, PipeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The two operand kinds of the dataflow graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum VertexKind {
    #[serde(rename = "op")]
    Operation,
    #[serde(rename = "queue")]
    Queue,
}

/// A reference to a graph vertex: its name plus the kind namespace the name
/// lives in.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct OperandRef {
    pub name: String,
    pub kind: VertexKind,
}

impl OperandRef {
    /// Creates an operation reference.
    pub fn operation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VertexKind::Operation,
        }
    }

    /// Creates a queue reference.
    pub fn queue(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VertexKind::Queue,
        }
    }
}

/// Errors raised by graph-vertex bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An input or output list already contains an operand with this name.
    #[error("operand '{operand}' assigned twice to vertex '{vertex}'")]
    DuplicateOperand { vertex: String, operand: String },

    /// A non-core node was assigned as an operation's core.
    #[error("can't assign the non-core {core} to operation '{operation}'")]
    NonCoreAssignment { core: NodeUid, operation: String },

    /// A core was assigned to a queue vertex.
    #[error("vertex '{0}' is a queue and cannot own cores")]
    NotAnOperation(String),
}

/// Kind-specific vertex payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VertexPayload {
    Operation {
        /// UIDs of the cores implementing this operation.
        cores: Vec<NodeUid>,
        /// Per-operation performance details, once available.
        perf: Option<OpPerfDetails>,
    },
    Queue {
        /// Descriptor payload, once available.
        details: Option<QueueDetails>,
    },
}

/// One vertex of the dataflow graph.
///
/// Input/output lists are order-preserving (operand index matters for
/// performance attribution) and never contain two operands of the same
/// name. The per-core pipe map only ever grows: merging appends new pipe
/// IDs per core, it never replaces what is already recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphVertex {
    /// The vertex name, unique within its kind's namespace.
    pub name: String,
    /// Kind-specific payload.
    pub payload: VertexPayload,
    inputs: Vec<OperandRef>,
    outputs: Vec<OperandRef>,
    pipe_ids_by_core: HashMap<NodeUid, Vec<PipeId>>,
    pipes_per_operator: HashMap<String, Vec<PipeId>>,
    pipes_per_operator_indexed: HashMap<String, Vec<Vec<PipeId>>>,
}

impl GraphVertex {
    /// Creates an operation vertex with no cores or operands yet.
    pub fn operation(name: impl Into<String>) -> Self {
        Self::new(
            name,
            VertexPayload::Operation {
                cores: Vec::new(),
                perf: None,
            },
        )
    }

    /// Creates a queue vertex with no descriptor details yet.
    pub fn queue(name: impl Into<String>) -> Self {
        Self::new(name, VertexPayload::Queue { details: None })
    }

    fn new(name: impl Into<String>, payload: VertexPayload) -> Self {
        Self {
            name: name.into(),
            payload,
            inputs: Vec::new(),
            outputs: Vec::new(),
            pipe_ids_by_core: HashMap::new(),
            pipes_per_operator: HashMap::new(),
            pipes_per_operator_indexed: HashMap::new(),
        }
    }

    /// The vertex kind discriminant.
    pub fn kind(&self) -> VertexKind {
        match self.payload {
            VertexPayload::Operation { .. } => VertexKind::Operation,
            VertexPayload::Queue { .. } => VertexKind::Queue,
        }
    }

    /// A reference to this vertex.
    pub fn as_ref(&self) -> OperandRef {
        OperandRef {
            name: self.name.clone(),
            kind: self.kind(),
        }
    }

    /// Input operands, in assignment order.
    pub fn inputs(&self) -> &[OperandRef] {
        &self.inputs
    }

    /// Output operands, in assignment order.
    pub fn outputs(&self) -> &[OperandRef] {
        &self.outputs
    }

    /// Appends an input operand, rejecting a second operand of the same
    /// name. Use [`assign_input`](Self::assign_input) for the merging
    /// behavior of repeated augmentation.
    pub fn try_assign_input(&mut self, operand: OperandRef) -> Result<(), GraphError> {
        Self::try_assign(&self.name, &mut self.inputs, operand)
    }

    /// Appends an output operand, rejecting a second operand of the same
    /// name.
    pub fn try_assign_output(&mut self, operand: OperandRef) -> Result<(), GraphError> {
        Self::try_assign(&self.name, &mut self.outputs, operand)
    }

    fn try_assign(
        vertex: &str,
        list: &mut Vec<OperandRef>,
        operand: OperandRef,
    ) -> Result<(), GraphError> {
        if list.iter().any(|existing| existing.name == operand.name) {
            return Err(GraphError::DuplicateOperand {
                vertex: vertex.to_string(),
                operand: operand.name,
            });
        }
        list.push(operand);
        Ok(())
    }

    /// Appends an input operand unless one of that name is already present.
    ///
    /// Re-presenting a known operand is the normal case when the same
    /// document is applied again, so it is a silent merge; presenting a
    /// *different* kind under a known name is logged and ignored.
    pub fn assign_input(&mut self, operand: OperandRef) {
        Self::assign(&self.name, &mut self.inputs, operand);
    }

    /// Appends an output operand unless one of that name is already present.
    pub fn assign_output(&mut self, operand: OperandRef) {
        Self::assign(&self.name, &mut self.outputs, operand);
    }

    fn assign(vertex: &str, list: &mut Vec<OperandRef>, operand: OperandRef) {
        match list.iter().find(|existing| existing.name == operand.name) {
            None => list.push(operand),
            Some(existing) if existing.kind != operand.kind => {
                log::warn!(
                    "vertex '{vertex}' already references operand '{}' as {:?}; ignoring {:?}",
                    operand.name,
                    existing.kind,
                    operand.kind
                );
            }
            Some(_) => {}
        }
    }

    /// Merges pipe IDs for one core into the per-core map.
    ///
    /// The merge is a union: IDs already recorded for the core stay, new
    /// ones are appended. Applying the same IDs twice is a no-op.
    pub fn merge_pipe_ids_for_core(&mut self, core: NodeUid, pipe_ids: &[PipeId]) {
        let entry = self.pipe_ids_by_core.entry(core).or_default();
        for id in pipe_ids {
            if !entry.contains(id) {
                entry.push(id.clone());
            }
        }
    }

    /// The per-core pipe-ID map.
    pub fn pipe_ids_by_core(&self) -> &HashMap<NodeUid, Vec<PipeId>> {
        &self.pipe_ids_by_core
    }

    /// The deduplicated union of every core's pipe IDs, sorted.
    pub fn unique_pipe_ids(&self) -> Vec<PipeId> {
        let set: BTreeSet<&PipeId> = self.pipe_ids_by_core.values().flatten().collect();
        set.into_iter().cloned().collect()
    }

    /// Records which pipes flow between this vertex and `operator`, and at
    /// which positional operand slot. Duplicate pipe IDs are dropped in
    /// both the flat and the indexed view.
    pub fn set_pipes_for_operator(&mut self, operator: &str, pipe_ids: &[PipeId], index: usize) {
        let flat = self
            .pipes_per_operator
            .entry(operator.to_string())
            .or_default();
        for id in pipe_ids {
            if !flat.contains(id) {
                flat.push(id.clone());
            }
        }

        let indexed = self
            .pipes_per_operator_indexed
            .entry(operator.to_string())
            .or_default();
        if indexed.len() <= index {
            indexed.resize(index + 1, Vec::new());
        }
        let slot = &mut indexed[index];
        for id in pipe_ids {
            if !slot.contains(id) {
                slot.push(id.clone());
            }
        }
    }

    /// All pipes flowing between this vertex and `operator`.
    pub fn pipes_for_operator(&self, operator: &str) -> &[PipeId] {
        self.pipes_per_operator
            .get(operator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pipes flowing between this vertex and one positional operand slot of
    /// `operator`.
    pub fn pipes_for_operator_indexed(&self, operator: &str, index: usize) -> &[PipeId] {
        self.pipes_per_operator_indexed
            .get(operator)
            .and_then(|slots| slots.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The cores implementing this operation; empty for queues.
    pub fn cores(&self) -> &[NodeUid] {
        match &self.payload {
            VertexPayload::Operation { cores, .. } => cores,
            VertexPayload::Queue { .. } => &[],
        }
    }

    /// Assigns a core to this operation.
    ///
    /// Only [`NodeType::Core`] cells may implement an operation; anything
    /// else is a structural error. Re-assigning a known core is tolerated
    /// with a warning. The caller is responsible for the node-side
    /// back-reference (`ComputeNode::set_operation`).
    pub fn assign_core(&mut self, core: NodeUid, core_type: NodeType) -> Result<(), GraphError> {
        if core_type != NodeType::Core {
            return Err(GraphError::NonCoreAssignment {
                core,
                operation: self.name.clone(),
            });
        }
        match &mut self.payload {
            VertexPayload::Operation { cores, .. } => {
                if cores.contains(&core) {
                    log::warn!(
                        "core {core} is already assigned to operation '{}'",
                        self.name
                    );
                } else {
                    cores.push(core);
                }
                Ok(())
            }
            VertexPayload::Queue { .. } => Err(GraphError::NotAnOperation(self.name.clone())),
        }
    }

    /// Attaches per-operation performance details (last write wins).
    pub fn set_op_perf(&mut self, details: OpPerfDetails) {
        if let VertexPayload::Operation { perf, .. } = &mut self.payload {
            *perf = Some(details);
        }
    }

    /// Per-operation performance details, if attached.
    pub fn op_perf(&self) -> Option<&OpPerfDetails> {
        match &self.payload {
            VertexPayload::Operation { perf, .. } => perf.as_ref(),
            VertexPayload::Queue { .. } => None,
        }
    }

    /// The operand responsible for the runtime bottleneck, resolved from
    /// the attached performance details.
    pub fn slowest_operand(&self) -> Option<&OperandRef> {
        let performance = self.op_perf()?.measurements.slowest_operand_performance()?;
        match performance.direction {
            crate::perf::OperandDirection::Input => self.inputs.get(performance.index),
            crate::perf::OperandDirection::Output => self.outputs.get(performance.index),
        }
    }

    /// Attaches queue descriptor details (last write wins).
    pub fn set_queue_details(&mut self, new_details: QueueDetails) {
        if let VertexPayload::Queue { details } = &mut self.payload {
            *details = Some(new_details);
        }
    }

    /// Queue descriptor details, if attached.
    pub fn queue_details(&self) -> Option<&QueueDetails> {
        match &self.payload {
            VertexPayload::Queue { details } => details.as_ref(),
            VertexPayload::Operation { .. } => None,
        }
    }

    /// Whether this vertex lives off-chip relative to `chip`.
    ///
    /// An operation is off-chip when it has no cores on record or its cores
    /// belong to another chip. A queue is off-chip when its descriptor
    /// places it on the host or allocates it to another device; a queue
    /// with no descriptor yet is considered on-chip.
    pub fn is_offchip(&self, chip: ChipId) -> bool {
        match &self.payload {
            VertexPayload::Operation { cores, .. } => match cores.first() {
                Some(core) => core.chip != chip,
                None => true,
            },
            VertexPayload::Queue { details } => details.as_ref().is_some_and(|details| {
                details.processed_location == QueueLocation::Host
                    || details.device_id != i64::from(chip.as_raw())
            }),
        }
    }
}

/// Where a queue's storage lives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueLocation {
    /// Unknown or unrecognized location; the raw string is preserved in
    /// the descriptor details.
    #[default]
    None,
    Host,
    Dram,
}

/// Parses a raw descriptor location string like `"LOCATION::DRAM"`.
///
/// Unrecognized locations pass through as [`QueueLocation::None`]; the raw
/// string stays available on the descriptor.
pub fn parse_queue_location(location: &str) -> QueueLocation {
    let Some(rest) = location
        .find("LOCATION::")
        .map(|at| &location[at + "LOCATION::".len()..])
    else {
        return QueueLocation::None;
    };
    let word: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match word.as_str() {
        "HOST" => QueueLocation::Host,
        "DRAM" => QueueLocation::Dram,
        _ => QueueLocation::None,
    }
}

/// One DRAM allocation of a queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationInfo {
    #[serde(default)]
    pub address: u64,
    #[serde(default)]
    pub channel: u32,
    #[serde(default)]
    pub subchannel: u32,
}

/// Descriptor payload attached to a queue by the queue-detail pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueDetails {
    /// Raw location string, e.g. `"LOCATION::DRAM"`.
    #[serde(default)]
    pub location: String,
    /// Location parsed from `location`; computed at attach time, not read
    /// from the document.
    #[serde(default, skip_deserializing)]
    pub processed_location: QueueLocation,
    #[serde(default, rename = "device-id")]
    pub device_id: i64,
    #[serde(default, rename = "source-device-id")]
    pub source_device_id: i64,
    #[serde(default, rename = "allocation-info")]
    pub allocation_info: Vec<AllocationInfo>,
    #[serde(default)]
    pub entries: u64,
    #[serde(default, rename = "grid-size")]
    pub grid_size: [u32; 2],
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub input: String,
    #[serde(default, rename = "data-format")]
    pub data_format: String,
    #[serde(default, rename = "block-dim")]
    pub block_dim: String,
    #[serde(default, rename = "tile-dim")]
    pub tile_dim: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default, rename = "type")]
    pub queue_type: String,
}
