//! Conformance test helpers for the meshview pipeline.
//!
//! Provides JSON fixture builders for the analyzer document shapes so the
//! integration tests can assemble realistic aggregates without touching
//! the filesystem.

#![warn(missing_docs)]

use meshview_chip::json::{NetlistDocument, OperationsDocument};
use serde_json::{json, Value};

/// Builds a placement document from a list of node entries.
///
/// Totals and architecture come in as-is so tests can exercise the
/// zero-cycles path.
pub fn netlist_doc(
    chip_id: u32,
    slowest_op_cycles: u64,
    bw_limited_op_cycles: u64,
    nodes: Vec<Value>,
) -> NetlistDocument {
    serde_json::from_value(json!({
        "slowest_op_cycles": slowest_op_cycles,
        "bw_limited_op_cycles": bw_limited_op_cycles,
        "arch": "grayskull",
        "chip_id": chip_id,
        "nodes": nodes,
        "dram_channels": []
    }))
    .unwrap()
}

/// Builds one core node entry at `[row, col]` running `op_name`, with one
/// link carrying the given pipes.
pub fn core_node(
    row: u32,
    col: u32,
    op_name: &str,
    link_name: &str,
    total_data: f64,
    pipes: &[(&str, f64)],
) -> Value {
    let mapped: serde_json::Map<String, Value> = pipes
        .iter()
        .map(|(id, bw)| (id.to_string(), json!(bw)))
        .collect();
    json!({
        "location": [row, col],
        "type": "core",
        "op_name": op_name,
        "op_cycles": 100,
        "links": {
            link_name: {
                "num_occupants": pipes.len(),
                "total_data_in_bytes": total_data,
                "max_link_bw": 100.0,
                "mapped_pipes": mapped
            }
        }
    })
}

/// Builds an ops-to-pipes document from raw JSON entries.
pub fn ops_doc(entries: Value) -> OperationsDocument {
    serde_json::from_value(entries).unwrap()
}
