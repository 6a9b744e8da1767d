//! Configuration schema.

use serde::{Deserialize, Serialize};

/// The full `meshview.toml` schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshviewConfig {
    #[serde(default)]
    pub bandwidth: BandwidthConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Assumed peak bandwidth per link class, in GB/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandwidthConfig {
    /// DRAM bank bandwidth. Adjustable per deployment.
    #[serde(default = "default_dram_gbs")]
    pub dram_gbs: f64,
    /// Ethernet link bandwidth. Fixed by the fabric.
    #[serde(default = "default_eth_gbs")]
    pub eth_gbs: f64,
    /// PCIe link bandwidth.
    #[serde(default = "default_pcie_gbs")]
    pub pcie_gbs: f64,
}

fn default_dram_gbs() -> f64 {
    21.5
}

fn default_eth_gbs() -> f64 {
    12.5
}

fn default_pcie_gbs() -> f64 {
    24.0
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self {
            dram_gbs: default_dram_gbs(),
            eth_gbs: default_eth_gbs(),
            pcie_gbs: default_pcie_gbs(),
        }
    }
}

/// Clock assumptions used to convert byte totals into bytes per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    #[serde(default = "default_aiclk_mhz")]
    pub aiclk_mhz: u32,
}

fn default_aiclk_mhz() -> u32 {
    1000
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            aiclk_mhz: default_aiclk_mhz(),
        }
    }
}

/// Congestion and performance thresholds for the initial view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Link saturation percentage above which a link is highlighted.
    #[serde(default = "default_link_saturation_percent")]
    pub link_saturation_percent: f64,
    /// Congestion value at which the congestion scale tops out.
    #[serde(default = "default_max_congestion")]
    pub max_congestion: f64,
    /// Initial operation performance threshold.
    #[serde(default = "default_op_performance")]
    pub op_performance: f64,
    /// Performance value at which the performance scale tops out.
    #[serde(default = "default_max_op_performance")]
    pub max_op_performance: f64,
    /// Lower bound of the model-ratio slider.
    #[serde(default)]
    pub min_model_ratio: f64,
    /// Upper bound of the model-ratio slider.
    #[serde(default = "default_max_model_ratio")]
    pub max_model_ratio: f64,
}

fn default_link_saturation_percent() -> f64 {
    75.0
}

fn default_max_congestion() -> f64 {
    120.0
}

fn default_op_performance() -> f64 {
    1.0
}

fn default_max_op_performance() -> f64 {
    5.0
}

fn default_max_model_ratio() -> f64 {
    10.0
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            link_saturation_percent: default_link_saturation_percent(),
            max_congestion: default_max_congestion(),
            op_performance: default_op_performance(),
            max_op_performance: default_max_op_performance(),
            min_model_ratio: 0.0,
            max_model_ratio: default_max_model_ratio(),
        }
    }
}
