//! Wire types for the analyzer output documents.
//!
//! One deserializable type per ingest source. Fields default when absent so
//! that partially populated documents (common for in-progress epochs) still
//! parse; structural problems surface later, in the augmentation passes,
//! where there is enough context for a useful error.

use meshview_common::ChipId;
use meshview_model::{DramChannelJson, LinkJson, MeasurementDetails, OpPerfDetails, QueueDetails};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The placement/netlist analyzer document for one (chip, epoch) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetlistDocument {
    #[serde(default)]
    pub slowest_op_cycles: u64,
    #[serde(default)]
    pub bw_limited_op_cycles: u64,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub chip_id: u32,
    #[serde(default)]
    pub nodes: Vec<NodeJson>,
    #[serde(default)]
    pub dram_channels: Vec<DramChannelJson>,
}

/// One grid-cell entry of the placement document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeJson {
    /// `[row, col]` order, normalized exactly once at UID construction.
    pub location: [u32; 2],
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub op_name: String,
    #[serde(default)]
    pub op_cycles: u64,
    #[serde(default)]
    pub dram_channel: Option<u32>,
    #[serde(default)]
    pub dram_subchannel: Option<u32>,
    #[serde(default)]
    pub harvested: bool,
    /// Link payloads keyed by link-direction name.
    #[serde(default)]
    pub links: BTreeMap<String, LinkJson>,
}

/// The ops-to-pipes document: operation name to operand lists.
pub type OperationsDocument = BTreeMap<String, OperationJson>;

/// One operation's entry in the ops-to-pipes document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationJson {
    #[serde(default)]
    pub inputs: Vec<OperandJson>,
    #[serde(default)]
    pub outputs: Vec<OperandJson>,
}

/// One operand of an ops-to-pipes entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperandJson {
    #[serde(default)]
    pub name: String,
    /// `"queue"` for queues; anything else is an operation.
    #[serde(default, rename = "type")]
    pub operand_type: String,
    /// Core ID (in the document's transposed `"<chip>-<col>-<row>"` form)
    /// to the pipe IDs that operand moves through on that core.
    #[serde(default)]
    pub pipes: BTreeMap<String, Vec<String>>,
}

impl OperandJson {
    /// Whether this operand names a queue (as opposed to an operation).
    pub fn is_queue(&self) -> bool {
        self.operand_type == "queue"
    }
}

/// The queue descriptor document: queue name to descriptor payload.
pub type QueueDescriptorDocument = BTreeMap<String, QueueDetails>;

/// The per-core perf-analyzer document: canonical core UID string to
/// measurement record.
pub type CorePerfDocument = BTreeMap<String, MeasurementDetails>;

/// The per-operation perf document consumed by the augmentation pass:
/// operation name to merged perf record. Produced from
/// [`OpPerfReportDocument`] by [`OpPerfEntryJson::to_op_perf_details`].
pub type OpPerfDocument = BTreeMap<String, OpPerfDetails>;

/// The raw per-op perf report as the analyzer writes it: operation name to
/// a three-part entry (measurements, attributes, per-core measurements).
pub type OpPerfReportDocument = BTreeMap<String, OpPerfEntryJson>;

/// One operation's raw entry in the per-op perf report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpPerfEntryJson {
    #[serde(default, rename = "op-measurements")]
    pub op_measurements: Map<String, Value>,
    #[serde(default, rename = "op-attributes")]
    pub op_attributes: Map<String, Value>,
    /// Keys are core locations without the chip component; the loader
    /// prefixes the owning chip's ID before the per-core pass sees them.
    #[serde(default, rename = "core-measurements")]
    pub core_measurements: BTreeMap<String, MeasurementDetails>,
}

impl OpPerfEntryJson {
    /// Merges measurements and attributes into one per-op perf record.
    /// Attribute fields win over same-named measurement fields.
    pub fn to_op_perf_details(&self) -> Result<OpPerfDetails, serde_json::Error> {
        let mut merged = self.op_measurements.clone();
        for (key, value) in &self.op_attributes {
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged))
    }

    /// The per-core measurements re-keyed into canonical core UIDs by
    /// prefixing the owning chip's ID.
    pub fn core_measurements_for_chip(&self, chip: ChipId) -> CorePerfDocument {
        self.core_measurements
            .iter()
            .map(|(key, details)| (format!("{chip}-{key}"), details.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn netlist_document_parses() {
        let doc: NetlistDocument = serde_json::from_value(json!({
            "slowest_op_cycles": 1000,
            "bw_limited_op_cycles": 1200,
            "arch": "grayskull",
            "chip_id": 0,
            "nodes": [
                {
                    "location": [1, 2],
                    "type": "core",
                    "op_name": "matmul",
                    "op_cycles": 500,
                    "links": {
                        "noc0_link_in": {
                            "num_occupants": 1,
                            "total_data_in_bytes": 200.0,
                            "max_link_bw": 100.0,
                            "mapped_pipes": {"p1": 50.0}
                        }
                    }
                }
            ],
            "dram_channels": []
        }))
        .unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].location, [1, 2]);
        assert_eq!(doc.nodes[0].links["noc0_link_in"].mapped_pipes["p1"], 50.0);
        assert!(!doc.nodes[0].harvested);
    }

    #[test]
    fn operand_kind_discrimination() {
        let ops: OperationsDocument = serde_json::from_value(json!({
            "matmul": {
                "inputs": [
                    {"name": "q0", "type": "queue", "pipes": {"0-1-1": ["p1"]}}
                ],
                "outputs": [
                    {"name": "softmax", "type": "op", "pipes": {}}
                ]
            }
        }))
        .unwrap();
        let entry = &ops["matmul"];
        assert!(entry.inputs[0].is_queue());
        assert!(!entry.outputs[0].is_queue());
        assert_eq!(entry.inputs[0].pipes["0-1-1"], vec!["p1"]);
    }

    #[test]
    fn op_perf_entry_merges_measurements_and_attributes() {
        let entry: OpPerfEntryJson = serde_json::from_value(json!({
            "op-measurements": {
                "kernel_total_runtime": 5000.0,
                "bw_limited_factor": 2.0,
                "slowest_operand": "input-0"
            },
            "op-attributes": {
                "op_name": "matmul_0",
                "graph_name": "fwd_0",
                "grid_size": "[2,1]"
            },
            "core-measurements": {
                "1-1": {"kernel_total_runtime": 2500.0}
            }
        }))
        .unwrap();
        let details = entry.to_op_perf_details().unwrap();
        assert_eq!(details.op_name, "matmul_0");
        assert_eq!(details.measurements.kernel_total_runtime, 5000.0);
        assert_eq!(details.measurements.bw_limited_factor, 2.0);

        let per_core = entry.core_measurements_for_chip(ChipId::from_raw(3));
        assert!(per_core.contains_key("3-1-1"));
        assert_eq!(per_core["3-1-1"].kernel_total_runtime, 2500.0);
    }
}
