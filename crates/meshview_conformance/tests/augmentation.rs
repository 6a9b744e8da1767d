//! Tests for the augmentation passes: idempotent merges, bidirectional
//! operand linkage, and the end-to-end single-core scenario.

use meshview_chip::GraphOnChip;
use meshview_common::{NodeUid, PipeId};
use meshview_conformance::{core_node, netlist_doc, ops_doc};
use meshview_model::VertexKind;
use serde_json::json;

fn uid(s: &str) -> NodeUid {
    s.parse().unwrap()
}

#[test]
fn single_core_scenario_links_queue_operation_and_pipe() {
    // One core at [0, 0] running "matmul"; one input queue "q0" feeding it
    // through pipe p1. The ops document keys cores as "<chip>-<col>-<row>".
    let doc = netlist_doc(
        0,
        1000,
        900,
        vec![core_node(0, 0, "matmul", "noc0_link_in", 100.0, &[("p1", 25.0)])],
    );
    let ops = ops_doc(json!({
        "matmul": {
            "inputs": [
                {"name": "q0", "type": "queue", "pipes": {"0-0-0": ["p1"]}}
            ],
            "outputs": []
        }
    }));
    let chip = GraphOnChip::from_netlist(&doc)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap();

    let op = chip.operation("matmul").unwrap();
    assert_eq!(op.inputs().len(), 1);
    assert_eq!(op.inputs()[0].name, "q0");
    assert_eq!(op.inputs()[0].kind, VertexKind::Queue);

    let q0 = chip.queue("q0").unwrap();
    assert_eq!(q0.outputs().len(), 1);
    assert_eq!(q0.outputs()[0].name, "matmul");
    assert_eq!(q0.outputs()[0].kind, VertexKind::Operation);

    let p1 = chip.pipe(&PipeId::new("p1")).unwrap();
    assert_eq!(p1.consumer_core_input_operand.as_deref(), Some("q0"));
    assert_eq!(p1.consumer_cores, vec![uid("0-0-0")]);
}

#[test]
fn reapplying_the_same_ops_document_changes_nothing() {
    let doc = netlist_doc(
        0,
        1000,
        900,
        vec![
            core_node(0, 0, "matmul", "noc0_link_in", 100.0, &[("p1", 25.0)]),
            core_node(0, 1, "matmul", "noc0_link_out", 100.0, &[("p2", 25.0)]),
        ],
    );
    let ops = ops_doc(json!({
        "matmul": {
            "inputs": [
                {"name": "q0", "type": "queue", "pipes": {"0-0-0": ["p1"]}}
            ],
            "outputs": [
                {"name": "q1", "type": "queue", "pipes": {"0-1-0": ["p2"]}}
            ]
        }
    }));

    let chip = GraphOnChip::from_netlist(&doc)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap();

    let q0 = chip.queue("q0").unwrap();
    assert_eq!(q0.pipe_ids_by_core()[&uid("0-0-0")], vec![PipeId::new("p1")]);
    assert_eq!(q0.outputs().len(), 1);
    assert_eq!(q0.unique_pipe_ids(), vec![PipeId::new("p1")]);

    let op = chip.operation("matmul").unwrap();
    assert_eq!(op.inputs().len(), 1);
    assert_eq!(op.outputs().len(), 1);

    let p2 = chip.pipe(&PipeId::new("p2")).unwrap();
    assert_eq!(p2.producer_cores, vec![uid("0-0-1")]);
    assert_eq!(
        chip.node(uid("0-0-1")).unwrap().producer_pipes,
        vec![PipeId::new("p2")]
    );
}

#[test]
fn operations_for_other_chips_are_skipped() {
    let doc = netlist_doc(
        0,
        1000,
        900,
        vec![core_node(0, 0, "matmul", "noc0_link_in", 100.0, &[("p1", 25.0)])],
    );
    let ops = ops_doc(json!({
        "remote_op": {
            "inputs": [
                {"name": "remote_q", "type": "queue", "pipes": {"3-0-0": ["p9"]}}
            ],
            "outputs": []
        }
    }));
    let chip = GraphOnChip::from_netlist(&doc)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap();

    assert!(chip.try_operation("remote_op").is_none());
    assert!(chip.try_queue("remote_q").is_none());
}

#[test]
fn pipe_ids_missing_from_the_pipe_table_are_tolerated() {
    let doc = netlist_doc(
        0,
        1000,
        900,
        vec![core_node(0, 0, "matmul", "noc0_link_in", 100.0, &[("p1", 25.0)])],
    );
    // The operand references p1 plus p_future, which no link carries yet.
    let ops = ops_doc(json!({
        "matmul": {
            "inputs": [
                {"name": "q0", "type": "queue", "pipes": {"0-0-0": ["p1", "p_future"]}}
            ],
            "outputs": []
        }
    }));
    let chip = GraphOnChip::from_netlist(&doc)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap();

    // The mapping is still recorded on the queue even though only p1
    // resolved to a pipe.
    let q0 = chip.queue("q0").unwrap();
    assert_eq!(
        q0.pipe_ids_by_core()[&uid("0-0-0")],
        vec![PipeId::new("p1"), PipeId::new("p_future")]
    );
    assert!(chip.try_pipe(&PipeId::new("p_future")).is_none());
    assert_eq!(
        chip.pipe(&PipeId::new("p1")).unwrap().consumer_cores,
        vec![uid("0-0-0")]
    );
}

#[test]
fn ops_document_core_ids_are_transposed() {
    // Node at [row=1, col=2] has canonical uid 0-1-2; the ops document
    // refers to it by the reversed "0-2-1".
    let doc = netlist_doc(
        0,
        1000,
        900,
        vec![core_node(1, 2, "matmul", "noc0_link_in", 100.0, &[("p1", 25.0)])],
    );
    let ops = ops_doc(json!({
        "matmul": {
            "inputs": [
                {"name": "q0", "type": "queue", "pipes": {"0-2-1": ["p1"]}}
            ],
            "outputs": []
        }
    }));
    let chip = GraphOnChip::from_netlist(&doc)
        .unwrap()
        .augment_with_operations(&ops)
        .unwrap();

    let q0 = chip.queue("q0").unwrap();
    assert!(q0.pipe_ids_by_core().contains_key(&uid("0-1-2")));
    assert_eq!(
        chip.pipe(&PipeId::new("p1")).unwrap().consumer_cores,
        vec![uid("0-1-2")]
    );
}

#[test]
fn perf_passes_accumulate_the_factor_maximum() {
    let doc = netlist_doc(
        0,
        1000,
        900,
        vec![core_node(0, 0, "matmul", "noc0_link_in", 100.0, &[("p1", 25.0)])],
    );
    let core_perf = serde_json::from_value(json!({
        "0-0-0": {"kernel_total_runtime": 500.0, "bw_limited_factor": 1.2}
    }))
    .unwrap();
    let op_perf = serde_json::from_value(json!({
        "matmul": {"op_name": "matmul", "bw_limited_factor": 2.2}
    }))
    .unwrap();
    let weaker_op_perf = serde_json::from_value(json!({
        "matmul": {"op_name": "matmul", "bw_limited_factor": 0.2}
    }))
    .unwrap();

    let chip = GraphOnChip::from_netlist(&doc)
        .unwrap()
        .augment_with_core_perf(&core_perf)
        .unwrap()
        .augment_with_op_perf(&op_perf)
        .unwrap()
        .augment_with_op_perf(&weaker_op_perf)
        .unwrap();

    // Last-write-wins on the record, max-accumulation on the summary.
    assert_eq!(chip.max_bw_limited_factor(), 2.2);
    let op = chip.operation("matmul").unwrap();
    assert_eq!(op.op_perf().unwrap().measurements.bw_limited_factor, 0.2);
}
