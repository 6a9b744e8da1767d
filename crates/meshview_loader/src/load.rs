//! Load orchestration.

use crate::error::LoadError;
use crate::layout::{
    self, DatasetKey, ANALYZER_RESULTS_DIR, CLUSTER_DESC_FILE, DEVICE_DESC_DIR, PERF_RESULTS_DIR,
    PER_OP_REPORT_FILE, QUEUE_DESCRIPTOR_FILE,
};
use meshview_chip::json::{
    CorePerfDocument, NetlistDocument, OpPerfDocument, OperationsDocument, OpPerfReportDocument,
    QueueDescriptorDocument,
};
use meshview_chip::GraphOnChip;
use meshview_cluster::{Cluster, ClusterDescriptorDocument, DeviceDescriptorDocument};
use meshview_common::ChipId;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One fully augmented aggregate.
#[derive(Debug)]
pub struct LoadedChip {
    pub key: DatasetKey,
    pub graph: GraphOnChip,
}

/// Everything loaded from one run folder. Only complete aggregates appear
/// in `chips`; pairs that failed any pass are reported in `failures`.
#[derive(Debug, Default)]
pub struct LoadedDataset {
    pub chips: Vec<LoadedChip>,
    pub cluster: Option<Cluster>,
    pub failures: Vec<LoadError>,
}

/// The ops-to-pipes report wraps its operation map in an `ops` field.
#[derive(Debug, Default, Deserialize)]
struct OpsReport {
    #[serde(default)]
    ops: OperationsDocument,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn chip_error(path: &Path) -> impl FnOnce(meshview_chip::ChipError) -> LoadError + '_ {
    move |source| LoadError::Chip {
        path: path.to_path_buf(),
        source,
    }
}

/// Paths of every per-op perf report in the run folder, one per graph.
fn per_op_report_paths(folder: &Path) -> Vec<PathBuf> {
    let dir = folder.join(PERF_RESULTS_DIR).join(ANALYZER_RESULTS_DIR);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        log::debug!("no analyzer results under {}", dir.display());
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path().join(PER_OP_REPORT_FILE))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    paths
}

/// Loads and fully augments the aggregate for one (chip, epoch) pair.
///
/// Pass order is fixed: placement, ops-to-pipes, queue details, per-core
/// perf, per-op perf. The placement document is required; every other
/// document is optional and skipped with a debug log when absent. Any
/// fatal error discards the aggregate and surfaces the originating file.
pub fn load_graph_on_chip(folder: &Path, key: DatasetKey) -> Result<GraphOnChip, LoadError> {
    let netlist_path = layout::find_netlist_file(folder, key)?;
    let netlist: NetlistDocument = read_json(&netlist_path)?;
    let mut graph = GraphOnChip::from_netlist(&netlist).map_err(chip_error(&netlist_path))?;

    match layout::find_ops_report(folder, key.epoch) {
        Some(ops_path) => {
            let report: OpsReport = read_json(&ops_path)?;
            graph = graph
                .augment_with_operations(&report.ops)
                .map_err(chip_error(&ops_path))?;
        }
        None => log::debug!(
            "no ops-to-pipes report for epoch {} under {}",
            key.epoch,
            folder.display()
        ),
    }

    let queues_path = folder.join(PERF_RESULTS_DIR).join(QUEUE_DESCRIPTOR_FILE);
    if queues_path.is_file() {
        let queues: QueueDescriptorDocument = read_json(&queues_path)?;
        graph = graph
            .augment_with_queue_details(&queues)
            .map_err(chip_error(&queues_path))?;
    } else {
        log::debug!("no queue descriptor at {}", queues_path.display());
    }

    for report_path in per_op_report_paths(folder) {
        let report: OpPerfReportDocument = read_json(&report_path)?;
        let mut core_perf = CorePerfDocument::new();
        let mut op_perf = OpPerfDocument::new();
        for (op_name, entry) in &report {
            core_perf.extend(entry.core_measurements_for_chip(graph.chip_id()));
            let details = entry
                .to_op_perf_details()
                .map_err(|source| LoadError::Parse {
                    path: report_path.clone(),
                    source,
                })?;
            op_perf.insert(op_name.clone(), details);
        }
        graph = graph
            .augment_with_core_perf(&core_perf)
            .map_err(chip_error(&report_path))?
            .augment_with_op_perf(&op_perf)
            .map_err(chip_error(&report_path))?;
    }

    Ok(graph)
}

/// Loads the cluster topology, if the folder carries one.
pub fn load_cluster(folder: &Path) -> Result<Option<Cluster>, LoadError> {
    let desc_path = folder.join(PERF_RESULTS_DIR).join(CLUSTER_DESC_FILE);
    if !desc_path.is_file() {
        log::debug!("no cluster descriptor at {}", desc_path.display());
        return Ok(None);
    }
    let descriptor: ClusterDescriptorDocument = read_json(&desc_path)?;

    let mut devices: BTreeMap<ChipId, DeviceDescriptorDocument> = BTreeMap::new();
    let device_dir = folder.join(PERF_RESULTS_DIR).join(DEVICE_DESC_DIR);
    if device_dir.is_dir() {
        for (name, path) in layout::read_dir_filenames(&device_dir)? {
            let Some(chip) = layout::chip_id_from_filename(&name) else {
                log::debug!("device descriptor '{name}' names no chip; skipping");
                continue;
            };
            let device: DeviceDescriptorDocument = read_json(&path)?;
            devices.insert(ChipId::from_raw(chip), device);
        }
    }

    let cluster =
        Cluster::from_descriptor(&descriptor, &devices).map_err(|source| LoadError::Cluster {
            path: desc_path,
            source,
        })?;
    Ok(Some(cluster))
}

/// Loads every discovered (chip, epoch) pair plus the cluster topology.
///
/// Pairs are independent, so `parallel` fans them out with rayon; each
/// pair's own pass sequence stays strictly ordered either way. A pair that
/// fails is reported in `failures` without affecting the others.
pub fn load_all(folder: &Path, parallel: bool) -> Result<LoadedDataset, LoadError> {
    let keys = layout::discover_pairs(folder)?;
    let load_one = |key: DatasetKey| load_graph_on_chip(folder, key).map(|graph| LoadedChip { key, graph });
    let results: Vec<Result<LoadedChip, LoadError>> = if parallel {
        keys.par_iter().map(|&key| load_one(key)).collect()
    } else {
        keys.iter().map(|&key| load_one(key)).collect()
    };

    let mut dataset = LoadedDataset {
        cluster: load_cluster(folder)?,
        ..LoadedDataset::default()
    };
    for result in results {
        match result {
            Ok(chip) => dataset.chips.push(chip),
            Err(error) => dataset.failures.push(error),
        }
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_common::PipeId;
    use serde_json::json;
    use std::fs;

    fn write_json(path: &Path, value: serde_json::Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    fn netlist_json(chip: u32) -> serde_json::Value {
        json!({
            "slowest_op_cycles": 1000,
            "bw_limited_op_cycles": 900,
            "arch": "wormhole_b0",
            "chip_id": chip,
            "nodes": [
                {
                    "location": [0, 0],
                    "type": "core",
                    "op_name": "matmul",
                    "op_cycles": 100,
                    "links": {
                        "noc0_link_in": {
                            "num_occupants": 1,
                            "total_data_in_bytes": 100.0,
                            "max_link_bw": 50.0,
                            "mapped_pipes": {"p1": 25.0}
                        }
                    }
                }
            ],
            "dram_channels": []
        })
    }

    fn populate(folder: &Path) {
        write_json(
            &folder.join("netlist_analyzer/analyzer_output_temporal_epoch_0_chip_0.json"),
            netlist_json(0),
        );
        write_json(
            &folder.join("reports/op_to_pipe_map_temporal_epoch_0.json"),
            json!({
                "ops": {
                    "matmul": {
                        "inputs": [
                            {"name": "q0", "type": "queue", "pipes": {"0-0-0": ["p1"]}}
                        ],
                        "outputs": []
                    }
                }
            }),
        );
        write_json(
            &folder.join("perf_results/queue_descriptor/queue_descriptor.json"),
            json!({
                "q0": {
                    "location": "LOCATION::HOST",
                    "device-id": 0,
                    "entries": 32
                }
            }),
        );
        write_json(
            &folder.join("perf_results/analyzer_results/fwd_0/graph_perf_report_per_op.json"),
            json!({
                "matmul": {
                    "op-measurements": {
                        "kernel_total_runtime": 800.0,
                        "bw_limited_factor": 1.8,
                        "slowest_operand": "input-0"
                    },
                    "op-attributes": {"op_name": "matmul", "graph_name": "fwd_0"},
                    "core-measurements": {
                        "0-0": {"kernel_total_runtime": 800.0, "bw_limited_factor": 1.8}
                    }
                }
            }),
        );
        write_json(
            &folder.join("perf_results/cluster_desc.json"),
            json!({
                "chips": {"0": [0, 0, 0, 0]},
                "ethernet_connections": [],
                "chips_with_mmio": [0]
            }),
        );
        write_json(
            &folder.join("perf_results/device_desc_runtime/device_desc_chip_0.json"),
            json!({"eth_cores": []}),
        );
    }

    #[test]
    fn full_folder_load() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let dataset = load_all(dir.path(), false).unwrap();
        assert!(dataset.failures.is_empty());
        assert_eq!(dataset.chips.len(), 1);
        let graph = &dataset.chips[0].graph;
        assert_eq!(dataset.chips[0].key, DatasetKey { chip: 0, epoch: 0 });

        let op = graph.operation("matmul").unwrap();
        assert_eq!(op.inputs()[0].name, "q0");
        assert_eq!(op.op_perf().unwrap().graph_name, "fwd_0");

        let node = graph.node("0-0-0".parse().unwrap()).unwrap();
        assert_eq!(node.perf.as_ref().unwrap().kernel_total_runtime, 800.0);
        assert_eq!(graph.max_bw_limited_factor(), 1.8);

        let pipe = graph.pipe(&PipeId::new("p1")).unwrap();
        assert_eq!(pipe.consumer_core_input_operand.as_deref(), Some("q0"));

        let cluster = dataset.cluster.unwrap();
        assert_eq!(cluster.len(), 1);
        assert!(cluster.chip(ChipId::from_raw(0)).unwrap().mmio);
    }

    #[test]
    fn parallel_load_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        write_json(
            &dir.path()
                .join("netlist_analyzer/analyzer_output_temporal_epoch_0_chip_1.json"),
            netlist_json(1),
        );

        let sequential = load_all(dir.path(), false).unwrap();
        let parallel = load_all(dir.path(), true).unwrap();
        let keys = |dataset: &LoadedDataset| -> Vec<DatasetKey> {
            dataset.chips.iter().map(|chip| chip.key).collect()
        };
        assert_eq!(keys(&sequential), keys(&parallel));
        assert_eq!(sequential.chips.len(), 2);
    }

    #[test]
    fn failed_pair_does_not_corrupt_others() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        // Chip 1's placement document declares an unknown link name.
        let mut broken = netlist_json(1);
        broken["nodes"][0]["links"] = json!({"noc9_warp_drive": {}});
        write_json(
            &dir.path()
                .join("netlist_analyzer/analyzer_output_temporal_epoch_0_chip_1.json"),
            broken,
        );

        let dataset = load_all(dir.path(), false).unwrap();
        assert_eq!(dataset.chips.len(), 1);
        assert_eq!(dataset.chips[0].key.chip, 0);
        assert_eq!(dataset.failures.len(), 1);
        assert!(matches!(dataset.failures[0], LoadError::Chip { .. }));
    }

    #[test]
    fn missing_optional_documents_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            &dir.path()
                .join("netlist_analyzer/analyzer_output_temporal_epoch_0_chip_0.json"),
            netlist_json(0),
        );

        let graph =
            load_graph_on_chip(dir.path(), DatasetKey { chip: 0, epoch: 0 }).unwrap();
        assert_eq!(graph.operations().count(), 1);
        assert!(!graph.has_queues());
        assert!(load_cluster(dir.path()).unwrap().is_none());
    }

    #[test]
    fn missing_netlist_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("netlist_analyzer")).unwrap();
        let result = load_graph_on_chip(dir.path(), DatasetKey { chip: 5, epoch: 0 });
        assert!(matches!(result, Err(LoadError::NetlistNotFound { .. })));
    }
}
