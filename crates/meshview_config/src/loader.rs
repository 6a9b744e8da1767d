//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::MeshviewConfig;
use std::path::Path;

/// Loads and validates a `meshview.toml` configuration file.
///
/// A missing file is not an error; it yields the default configuration.
pub fn load_config(path: &Path) -> Result<MeshviewConfig, ConfigError> {
    if !path.exists() {
        return Ok(MeshviewConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<MeshviewConfig, ConfigError> {
    let config: MeshviewConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &MeshviewConfig) -> Result<(), ConfigError> {
    let bandwidths = [
        ("bandwidth.dram_gbs", config.bandwidth.dram_gbs),
        ("bandwidth.eth_gbs", config.bandwidth.eth_gbs),
        ("bandwidth.pcie_gbs", config.bandwidth.pcie_gbs),
    ];
    for (field, value) in bandwidths {
        if !(value > 0.0 && value.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be a positive number, got {value}"
            )));
        }
    }
    if config.clock.aiclk_mhz == 0 {
        return Err(ConfigError::ValidationError(
            "clock.aiclk_mhz must be non-zero".to_string(),
        ));
    }
    let thresholds = &config.thresholds;
    if !(0.0..=100.0).contains(&thresholds.link_saturation_percent) {
        return Err(ConfigError::ValidationError(format!(
            "thresholds.link_saturation_percent must be within 0..=100, got {}",
            thresholds.link_saturation_percent
        )));
    }
    if thresholds.min_model_ratio > thresholds.max_model_ratio {
        return Err(ConfigError::ValidationError(
            "thresholds.min_model_ratio exceeds thresholds.max_model_ratio".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.bandwidth.dram_gbs, 21.5);
        assert_eq!(config.bandwidth.eth_gbs, 12.5);
        assert_eq!(config.bandwidth.pcie_gbs, 24.0);
        assert_eq!(config.clock.aiclk_mhz, 1000);
        assert_eq!(config.thresholds.link_saturation_percent, 75.0);
        assert_eq!(config.thresholds.max_congestion, 120.0);
    }

    #[test]
    fn partial_override() {
        let toml = r#"
[bandwidth]
dram_gbs = 25.0

[thresholds]
link_saturation_percent = 50.0
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.bandwidth.dram_gbs, 25.0);
        assert_eq!(config.bandwidth.eth_gbs, 12.5);
        assert_eq!(config.thresholds.link_saturation_percent, 50.0);
        assert_eq!(config.thresholds.max_op_performance, 5.0);
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_field_errors() {
        let err = load_config_from_str("[bandwidth]\nwarp_gbs = 9000.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn non_positive_bandwidth_errors() {
        let err = load_config_from_str("[bandwidth]\ndram_gbs = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn saturation_out_of_range_errors() {
        let err =
            load_config_from_str("[thresholds]\nlink_saturation_percent = 140.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn inverted_model_ratio_bounds_error() {
        let toml = "[thresholds]\nmin_model_ratio = 11.0\nmax_model_ratio = 10.0\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/meshview.toml")).unwrap();
        assert_eq!(config, MeshviewConfig::default());
    }
}
