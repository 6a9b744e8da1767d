//! The augmentation pipeline.
//!
//! Each pass takes the aggregate built so far plus one source document and
//! returns the enriched aggregate. Passes are additive and idempotent:
//! applying the same document twice never duplicates state, and identities
//! established by an earlier pass (node UIDs, operation names, pipe IDs)
//! are only ever enriched, never replaced.
//!
//! Data gaps that are normal for partial epochs (an operation belonging to
//! another chip, a pipe ID absent from the pipe table, a queue with no
//! vertex) are skipped with a debug log. Structural problems (unknown link
//! names, non-core operation assignment, perf join-key collisions) abort
//! the pass with a [`ChipError`] and the caller discards the aggregate.

use crate::error::ChipError;
use crate::graph_on_chip::{Architecture, GraphOnChip};
use crate::integrity::DataIntegrityErrorKind;
use crate::json::{
    CorePerfDocument, NetlistDocument, OpPerfDocument, OperandJson, OperationsDocument,
    QueueDescriptorDocument,
};
use meshview_common::{ChipId, NodeUid, PipeId};
use meshview_model::{
    parse_queue_location, ComputeNode, DramChannel, GraphVertex, LinkName, NetworkLink, NodeType,
    OperandRef, Pipe, QueueLocation, VertexKind,
};

/// Which side of an operation an ops-to-pipes operand sits on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OperandSide {
    Input,
    Output,
}

impl GraphOnChip {
    /// Builds the initial aggregate from a placement/netlist document.
    ///
    /// Creates every node with its typed links, folds all link pipe
    /// segments into the chip-level pipe map, creates operations first-seen
    /// from node `op_name` entries, and ingests the DRAM channel topology.
    /// A zero total-op-cycles value is recorded in the integrity log, not
    /// raised, because the aggregate is still usable.
    pub fn from_netlist(doc: &NetlistDocument) -> Result<GraphOnChip, ChipError> {
        let chip_id = ChipId::from_raw(doc.chip_id);
        let mut chip = GraphOnChip::empty(chip_id);
        chip.architecture = Architecture::parse(&doc.arch);
        chip.slowest_op_cycles = doc.slowest_op_cycles;
        chip.bw_limited_op_cycles = doc.bw_limited_op_cycles;
        if chip.total_op_cycles() == 0 {
            chip.integrity.record(
                DataIntegrityErrorKind::TotalOpCyclesIsZero,
                format!(
                    "chip {chip_id}: min(slowest_op_cycles={}, bw_limited_op_cycles={}) is zero",
                    doc.slowest_op_cycles, doc.bw_limited_op_cycles
                ),
            );
        }

        for node_json in &doc.nodes {
            let [row, col] = node_json.location;
            let uid = NodeUid::from_netlist_location(chip_id, row, col);
            let node_type = NodeType::parse(&node_json.node_type);
            let mut node = ComputeNode::new(uid, node_type);
            node.op_cycles = node_json.op_cycles;
            node.harvested = node_json.harvested;
            node.dram_channel_id = node_json.dram_channel;
            node.dram_subchannel_id = node_json.dram_subchannel.unwrap_or(0);

            for (raw_name, link_json) in &node_json.links {
                let name = LinkName::parse(raw_name)?;
                node.insert_link(NetworkLink::from_json(
                    name,
                    format!("{uid}-{raw_name}"),
                    link_json,
                ));
            }

            for link in node.links.values().chain(node.internal_links.values()) {
                for segment in &link.pipe_segments {
                    let pipe = chip
                        .pipes
                        .entry(segment.id.clone())
                        .or_insert_with(|| Pipe::new(segment.id.clone()));
                    pipe.segments.push(segment.clone());
                    pipe.add_node(uid);
                }
            }
            for id in node.pipe_ids() {
                node.add_pipe(id);
            }

            // First-seen creates the operation, subsequent-seen reuses it.
            if !node_json.op_name.is_empty() {
                let op = chip
                    .operations
                    .entry(node_json.op_name.clone())
                    .or_insert_with(|| GraphVertex::operation(node_json.op_name.clone()));
                op.assign_core(uid, node_type)?;
                node.set_operation(&node_json.op_name);
            }

            if let Some(channel) = node.dram_channel_id {
                chip.nodes_by_channel.entry(channel).or_default().push(uid);
            }
            chip.total_rows = chip.total_rows.max(uid.location.y + 1);
            chip.total_cols = chip.total_cols.max(uid.location.x + 1);
            chip.nodes.insert(uid, node);
        }

        for channel_json in &doc.dram_channels {
            let channel = DramChannel::from_json(channel_json)?;
            let channel_links = channel
                .links
                .iter()
                .chain(channel.subchannels.iter().flat_map(|sub| sub.links.iter()));
            for link in channel_links {
                for segment in &link.pipe_segments {
                    chip.pipes
                        .entry(segment.id.clone())
                        .or_insert_with(|| Pipe::new(segment.id.clone()))
                        .segments
                        .push(segment.clone());
                }
            }
            chip.dram_channels.push(channel);
        }

        Ok(chip)
    }

    /// Applies an ops-to-pipes document.
    ///
    /// Operations the chip does not know are skipped: a multi-chip run
    /// produces one document describing operations across all chips, and
    /// synthesizing them here would create phantom operations with no core
    /// mapping. For known operations, operand vertices are resolved or
    /// created, per-core pipe maps merged (union, never replace), queues
    /// linked back to the operation, and pipes marked with their
    /// producer/consumer cores and operands.
    pub fn augment_with_operations(
        mut self,
        doc: &OperationsDocument,
    ) -> Result<GraphOnChip, ChipError> {
        for (op_name, op_json) in doc {
            if !self.operations.contains_key(op_name) {
                log::debug!(
                    "operation '{op_name}' is not on chip {}; skipping",
                    self.chip_id
                );
                continue;
            }
            for (index, operand) in op_json.inputs.iter().enumerate() {
                self.apply_operand(op_name, operand, index, OperandSide::Input)?;
            }
            for (index, operand) in op_json.outputs.iter().enumerate() {
                self.apply_operand(op_name, operand, index, OperandSide::Output)?;
            }
        }
        Ok(self)
    }

    fn apply_operand(
        &mut self,
        op_name: &str,
        operand: &OperandJson,
        index: usize,
        side: OperandSide,
    ) -> Result<(), ChipError> {
        let operand_ref = if operand.is_queue() {
            OperandRef::queue(&operand.name)
        } else {
            OperandRef::operation(&operand.name)
        };

        let mut per_core: Vec<(NodeUid, Vec<PipeId>)> = Vec::with_capacity(operand.pipes.len());
        let mut all_ids: Vec<PipeId> = Vec::new();
        for (core_str, raw_ids) in &operand.pipes {
            let core = NodeUid::parse_transposed(core_str)?;
            let ids: Vec<PipeId> = raw_ids.iter().map(PipeId::new).collect();
            for id in &ids {
                if !all_ids.contains(id) {
                    all_ids.push(id.clone());
                }
            }
            per_core.push((core, ids));
        }

        let vertex = self.operand_vertex_mut(&operand_ref);
        for (core, ids) in &per_core {
            vertex.merge_pipe_ids_for_core(*core, ids);
        }
        vertex.set_pipes_for_operator(op_name, &all_ids, index);
        // Queues gain the reverse edge to the enclosing operation.
        if operand_ref.kind == VertexKind::Queue {
            match side {
                OperandSide::Input => vertex.assign_output(OperandRef::operation(op_name)),
                OperandSide::Output => vertex.assign_input(OperandRef::operation(op_name)),
            }
        }

        let op = self
            .operations
            .get_mut(op_name)
            .ok_or_else(|| ChipError::UnknownOperation(op_name.to_string()))?;
        match side {
            OperandSide::Input => op.assign_input(operand_ref),
            OperandSide::Output => op.assign_output(operand_ref),
        }

        for (core, ids) in &per_core {
            for id in ids {
                let Some(pipe) = self.pipes.get_mut(id) else {
                    log::debug!(
                        "pipe {id} referenced by operand '{}' is not in chip {}'s pipe table",
                        operand.name,
                        self.chip_id
                    );
                    continue;
                };
                match side {
                    OperandSide::Input => {
                        pipe.add_consumer_core(*core);
                        pipe.consumer_core_input_operand = Some(operand.name.clone());
                    }
                    OperandSide::Output => {
                        pipe.add_producer_core(*core);
                        pipe.producer_core_output_operand = Some(operand.name.clone());
                    }
                }
                if let Some(node) = self.nodes.get_mut(core) {
                    match side {
                        OperandSide::Input => node.add_consumer_pipe(id.clone()),
                        OperandSide::Output => node.add_producer_pipe(id.clone()),
                    }
                } else {
                    log::debug!("operand core {core} is not a node on chip {}", self.chip_id);
                }
            }
        }
        Ok(())
    }

    fn operand_vertex_mut(&mut self, operand: &OperandRef) -> &mut GraphVertex {
        match operand.kind {
            VertexKind::Queue => self
                .queues
                .entry(operand.name.clone())
                .or_insert_with(|| GraphVertex::queue(operand.name.clone())),
            VertexKind::Operation => self
                .operations
                .entry(operand.name.clone())
                .or_insert_with(|| GraphVertex::operation(operand.name.clone())),
        }
    }

    /// Attaches queue descriptor payloads.
    ///
    /// The raw location string is parsed into its normalized form at attach
    /// time. DRAM-located queues are additionally registered on every node
    /// of each DRAM channel their allocations reference.
    pub fn augment_with_queue_details(
        mut self,
        doc: &QueueDescriptorDocument,
    ) -> Result<GraphOnChip, ChipError> {
        for (name, raw_details) in doc {
            if !self.queues.contains_key(name) {
                log::debug!("queue '{name}' has no vertex on chip {}; skipping", self.chip_id);
                continue;
            }
            let mut details = raw_details.clone();
            details.processed_location = parse_queue_location(&details.location);
            let channels: Vec<u32> = if details.processed_location == QueueLocation::Dram {
                details.allocation_info.iter().map(|a| a.channel).collect()
            } else {
                Vec::new()
            };
            if let Some(queue) = self.queues.get_mut(name) {
                queue.set_queue_details(details);
            }
            for channel in channels {
                let uids: Vec<NodeUid> = self.nodes_for_channel(channel).to_vec();
                if uids.is_empty() {
                    log::debug!(
                        "queue '{name}' allocates on dram channel {channel} with no nodes on chip {}",
                        self.chip_id
                    );
                }
                for uid in uids {
                    if let Some(node) = self.nodes.get_mut(&uid) {
                        node.add_queue(name);
                    }
                }
            }
        }
        Ok(self)
    }

    /// Attaches per-core performance measurements.
    ///
    /// Every core UID in the document must resolve to a node of type core;
    /// anything else is a join-key collision and aborts the pass. The
    /// attached record is last-write-wins, the chip's bandwidth-limited
    /// factor summary is max-accumulating.
    pub fn augment_with_core_perf(
        mut self,
        doc: &CorePerfDocument,
    ) -> Result<GraphOnChip, ChipError> {
        for (core_str, details) in doc {
            let uid: NodeUid = core_str.parse()?;
            let node = self.nodes.get_mut(&uid).ok_or(ChipError::UnknownNode(uid))?;
            if node.node_type != NodeType::Core {
                return Err(ChipError::PerfTargetNotCore {
                    uid,
                    node_type: node.node_type,
                });
            }
            node.perf = Some(details.clone());
            if details.bw_limited_factor > self.max_bw_limited_factor {
                self.max_bw_limited_factor = details.bw_limited_factor;
            }
        }
        Ok(self)
    }

    /// Attaches per-operation performance records.
    ///
    /// Operations unknown to the chip are skipped (multi-chip partial
    /// data). Same write discipline as the per-core pass: last-write-wins
    /// record, max-accumulating summary.
    pub fn augment_with_op_perf(mut self, doc: &OpPerfDocument) -> Result<GraphOnChip, ChipError> {
        for (name, details) in doc {
            let Some(op) = self.operations.get_mut(name) else {
                log::debug!("op perf for '{name}' has no operation on chip {}", self.chip_id);
                continue;
            };
            let factor = details.measurements.bw_limited_factor;
            op.set_op_perf(details.clone());
            if factor > self.max_bw_limited_factor {
                self.max_bw_limited_factor = factor;
            }
        }
        Ok(self)
    }
}
