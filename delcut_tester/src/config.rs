//! Loading the inspection configuration from TOML, with CLI overrides on top.

use anyhow::{Context, Result};
use delcut_vision::{InspectionConfig, PolicySelection};
use std::path::Path;

/// Values given on the command line; each one replaces the file's value when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub policy: Option<PolicySelection>,
    pub hue_bins: Option<usize>,
    pub saturation_bins: Option<usize>,
}

/// Reads `path` if given, otherwise starts from defaults, then applies `overrides`.
pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<InspectionConfig> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: InspectionConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        None => InspectionConfig::default(),
    };

    if let Some(policy) = overrides.policy {
        config.policy = policy;
    }
    if let Some(hue_bins) = overrides.hue_bins {
        config.extraction.hue_bins = hue_bins;
    }
    if let Some(saturation_bins) = overrides.saturation_bins {
        config.extraction.saturation_bins = saturation_bins;
    }

    config.validate().context("Invalid inspection configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let config = load(None, Overrides::default()).unwrap();
        assert_eq!(config, InspectionConfig::default());
        assert_eq!(config.extraction.hue_bins, 180);
        assert_eq!(config.thresholds.single_texture_ratio, 0.85);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let file = write_config(
            r#"
policy = "first-match"

[thresholds]
multi_similarity = 0.6
"#,
        );
        let config = load(Some(file.path()), Overrides::default()).unwrap();
        assert_eq!(config.policy, PolicySelection::FirstMatch);
        assert_eq!(config.thresholds.multi_similarity, 0.6);
        assert_eq!(config.thresholds.multi_texture_ratio, 0.8);
        assert_eq!(config.extraction.saturation_bins, 256);
    }

    #[test]
    fn overrides_win_over_file() {
        let file = write_config("[extraction]\nhue_bins = 90\nsaturation_bins = 64\n");
        let overrides = Overrides {
            policy: Some(PolicySelection::SingleReference),
            hue_bins: Some(30),
            saturation_bins: None,
        };
        let config = load(Some(file.path()), overrides).unwrap();
        assert_eq!(config.extraction.hue_bins, 30);
        assert_eq!(config.extraction.saturation_bins, 64);
        assert_eq!(config.policy, PolicySelection::SingleReference);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let file = write_config("[thresholds]\nsingle_similarity = 3.0\n");
        assert!(load(Some(file.path()), Overrides::default()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/delcut.toml")), Overrides::default()).is_err());
    }
}
