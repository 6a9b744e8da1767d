//! The analyzer output folder layout.
//!
//! ```text
//! <run folder>/
//!   netlist_analyzer/analyzer_output_..._temporal_epoch_<e>_chip_<c>....json
//!   reports/..._temporal_epoch_<e>....json            (ops-to-pipes)
//!   perf_results/queue_descriptor/queue_descriptor.json
//!   perf_results/analyzer_results/<graph>/graph_perf_report_per_op.json
//!   perf_results/cluster_desc.json
//!   perf_results/device_desc_runtime/..._chip_<c>....json
//! ```
//!
//! Chip and epoch identity live in file names, parsed leniently: a file
//! participates if it carries the `temporal_epoch_<n>` marker and, where
//! needed, a `chip<n>` or `chip_<n>` component.

use crate::error::LoadError;
use std::path::{Path, PathBuf};

pub(crate) const NETLIST_DIR: &str = "netlist_analyzer";
pub(crate) const REPORTS_DIR: &str = "reports";
pub(crate) const PERF_RESULTS_DIR: &str = "perf_results";
pub(crate) const QUEUE_DESCRIPTOR_FILE: &str = "queue_descriptor/queue_descriptor.json";
pub(crate) const ANALYZER_RESULTS_DIR: &str = "analyzer_results";
pub(crate) const PER_OP_REPORT_FILE: &str = "graph_perf_report_per_op.json";
pub(crate) const CLUSTER_DESC_FILE: &str = "cluster_desc.json";
pub(crate) const DEVICE_DESC_DIR: &str = "device_desc_runtime";

const EPOCH_MARKER: &str = "temporal_epoch_";
const CHIP_MARKER: &str = "chip";

/// One (chip, temporal epoch) pair discovered in a run folder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DatasetKey {
    pub chip: u32,
    pub epoch: u32,
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: &str = &s[..s.chars().take_while(|c| c.is_ascii_digit()).count()];
    digits.parse().ok()
}

/// Parses the temporal epoch out of an analyzer file name.
pub(crate) fn epoch_from_filename(name: &str) -> Option<u32> {
    let at = name.find(EPOCH_MARKER)?;
    leading_number(&name[at + EPOCH_MARKER.len()..])
}

/// Parses the chip ID out of an analyzer file name (`chip<n>` or
/// `chip_<n>`).
pub(crate) fn chip_id_from_filename(name: &str) -> Option<u32> {
    let at = name.find(CHIP_MARKER)?;
    let rest = &name[at + CHIP_MARKER.len()..];
    leading_number(rest.strip_prefix('_').unwrap_or(rest))
}

pub(crate) fn read_dir_filenames(dir: &Path) -> Result<Vec<(String, PathBuf)>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_file() {
            names.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    names.sort();
    Ok(names)
}

/// Finds the placement document for one (chip, epoch) pair.
pub(crate) fn find_netlist_file(folder: &Path, key: DatasetKey) -> Result<PathBuf, LoadError> {
    let dir = folder.join(NETLIST_DIR);
    for (name, path) in read_dir_filenames(&dir)? {
        if !name.ends_with(".json") {
            continue;
        }
        if epoch_from_filename(&name) == Some(key.epoch)
            && chip_id_from_filename(&name) == Some(key.chip)
        {
            return Ok(path);
        }
    }
    Err(LoadError::NetlistNotFound {
        chip: key.chip,
        epoch: key.epoch,
        folder: folder.to_path_buf(),
    })
}

/// Finds the ops-to-pipes report for one epoch, if present.
pub(crate) fn find_ops_report(folder: &Path, epoch: u32) -> Option<PathBuf> {
    let dir = folder.join(REPORTS_DIR);
    let names = read_dir_filenames(&dir).ok()?;
    names
        .into_iter()
        .find(|(name, _)| name.ends_with(".json") && epoch_from_filename(name) == Some(epoch))
        .map(|(_, path)| path)
}

/// Scans the netlist analyzer directory for every (chip, epoch) pair with
/// a placement document.
pub fn discover_pairs(folder: &Path) -> Result<Vec<DatasetKey>, LoadError> {
    let dir = folder.join(NETLIST_DIR);
    let mut keys: Vec<DatasetKey> = read_dir_filenames(&dir)?
        .into_iter()
        .filter(|(name, _)| name.ends_with(".json"))
        .filter_map(|(name, _)| {
            let epoch = epoch_from_filename(&name)?;
            let chip = chip_id_from_filename(&name)?;
            Some(DatasetKey { chip, epoch })
        })
        .collect();
    keys.sort();
    keys.dedup();
    Ok(keys)
}
