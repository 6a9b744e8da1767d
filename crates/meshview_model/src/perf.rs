//! Performance measurement records attached by the perf-analyzer passes.
//!
//! The analyzer emits a fixed set of measurement fields plus dynamically
//! named per-operand bandwidth fields (`input_pipe_bw_<n>`,
//! `required_input_bw_<n>`, and the output equivalents). The dynamic fields
//! are captured through a flattened map and exposed through indexed
//! accessors. The measurement payload itself is opaque to the model; it is
//! carried, not interpreted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const INPUT_PIPE_BW: &str = "input_pipe_bw_";
const REQUIRED_INPUT_BW: &str = "required_input_bw_";
const OUTPUT_PIPE_BW: &str = "output_pipe_bw_";
const REQUIRED_OUTPUT_BW: &str = "required_output_bw_";

/// Per-core measurement record from a perf-analyzer document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDetails {
    #[serde(default)]
    pub kernel_total_runtime: f64,
    #[serde(default)]
    pub kernel_runtime_per_input: f64,
    #[serde(default)]
    pub kernel_math_utilization: f64,
    #[serde(default)]
    pub model_runtime_per_input: f64,
    #[serde(default)]
    pub model_math_utilization: f64,
    /// Bandwidth-limited factor; the chip-level summary keeps the running
    /// maximum of this value across all attached records.
    #[serde(default)]
    pub bw_limited_factor: f64,
    #[serde(default)]
    pub bw_bound_total_runtime: f64,
    #[serde(default)]
    pub bw_bound_runtime_per_input: f64,
    #[serde(default)]
    pub bw_bound_math_utilization: f64,
    /// Bottleneck tag of the form `"input-<n>"` or `"output-<n>"`.
    #[serde(default)]
    pub slowest_operand: String,
    #[serde(default)]
    pub warnings: String,
    /// Dynamically named per-operand bandwidth fields.
    #[serde(flatten)]
    pub dynamic: BTreeMap<String, serde_json::Value>,
}

impl MeasurementDetails {
    fn dynamic_f64(&self, prefix: &str, index: usize) -> Option<f64> {
        self.dynamic
            .get(&format!("{prefix}{index}"))
            .and_then(|value| value.as_f64())
    }

    /// Available bandwidth for input operand `index`.
    pub fn input_pipe_bw(&self, index: usize) -> Option<f64> {
        self.dynamic_f64(INPUT_PIPE_BW, index)
    }

    /// Required bandwidth for input operand `index`.
    pub fn required_input_bw(&self, index: usize) -> Option<f64> {
        self.dynamic_f64(REQUIRED_INPUT_BW, index)
    }

    /// Available bandwidth for output operand `index`.
    pub fn output_pipe_bw(&self, index: usize) -> Option<f64> {
        self.dynamic_f64(OUTPUT_PIPE_BW, index)
    }

    /// Required bandwidth for output operand `index`.
    pub fn required_output_bw(&self, index: usize) -> Option<f64> {
        self.dynamic_f64(REQUIRED_OUTPUT_BW, index)
    }

    /// Parses the `slowest_operand` tag into a direction and operand index.
    ///
    /// Tags that name neither direction yield `None`. A missing index
    /// defaults to 0 (the tag `"output"` alone means output operand 0).
    pub fn slowest_operand_performance(&self) -> Option<OperandPerformance> {
        let direction = if self.slowest_operand.starts_with("input") {
            OperandDirection::Input
        } else if self.slowest_operand.starts_with("output") {
            OperandDirection::Output
        } else {
            return None;
        };
        let index = self
            .slowest_operand
            .split('-')
            .nth(1)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        Some(OperandPerformance { direction, index })
    }

    /// Actual vs required bandwidth for the bottleneck operand.
    pub fn slowest_operand_details(&self) -> Option<SlowestOperandDetails> {
        let performance = self.slowest_operand_performance()?;
        let (actual, required) = match performance.direction {
            OperandDirection::Input => (
                self.input_pipe_bw(performance.index),
                self.required_input_bw(performance.index),
            ),
            OperandDirection::Output => (
                self.output_pipe_bw(performance.index),
                self.required_output_bw(performance.index),
            ),
        };
        Some(SlowestOperandDetails {
            direction: performance.direction,
            index: performance.index,
            actual,
            required,
            bw_limited_factor: self.bw_limited_factor,
        })
    }
}

/// Whether a bottleneck operand sits on the input or output side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandDirection {
    Input,
    Output,
}

/// The parsed bottleneck tag: which operand slot limits the runtime.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OperandPerformance {
    pub direction: OperandDirection,
    pub index: usize,
}

/// Bandwidth summary for the bottleneck operand.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SlowestOperandDetails {
    pub direction: OperandDirection,
    pub index: usize,
    pub actual: Option<f64>,
    pub required: Option<f64>,
    pub bw_limited_factor: f64,
}

/// Per-operation performance record: the measurement payload plus the
/// operation attributes carried alongside it in per-op reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpPerfDetails {
    /// The measurement payload, sharing the per-core shape.
    #[serde(flatten)]
    pub measurements: MeasurementDetails,
    #[serde(default)]
    pub op_name: String,
    #[serde(default)]
    pub graph_name: String,
    /// Format `"[<width>,<height>]"`, kept verbatim.
    #[serde(default)]
    pub grid_size: String,
    #[serde(default)]
    pub global_epoch_ids: Vec<u64>,
    #[serde(default)]
    pub program_names: Vec<String>,
    /// Input index range these results apply to, format `"<a>-><b>"`.
    #[serde(default)]
    pub first_to_last_input: String,
}
