//! Visualization defaults, loaded from `meshview.toml`.
//!
//! Everything here is a tunable the UI exposes as a slider or initial
//! state: bandwidth assumptions per link class, the AI clock used to turn
//! byte counts into bytes-per-cycle, and the congestion thresholds. Every
//! field has a sensible default, so a missing file or an empty file is a
//! valid configuration.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{BandwidthConfig, ClockConfig, MeshviewConfig, ThresholdConfig};
