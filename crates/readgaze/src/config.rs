//! Pipeline configuration
//!
//! Every tunable lives here so the streaming and batch paths share one set of
//! parameters. Files are TOML; missing sections keep their defaults.

use crate::detect::lines::LineConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV: &str = "READGAZE_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Gaussian sigma, in samples
    pub sigma: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { sigma: 3.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Speed below which an unlabelled sample counts as a fixation (px/ms)
    pub fixation_velocity: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            fixation_velocity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub smoothing: SmoothingConfig,
    pub classify: ClassifyConfig,
    pub lines: LineConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Explicit path first, then `READGAZE_CONFIG`, then defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.smoothing.sigma, 3.0);
        assert_eq!(config.classify.fixation_velocity, 0.5);
        assert_eq!(config.lines.k, 2.0);
        assert_eq!(config.lines.gap_ms, 120.0);
        assert!(config.lines.expand_one_sample);
        assert_eq!(config.lines.min_displacement_px, 100.0);
        assert_eq!(config.lines.min_line_gap_ms, 300.0);
        assert_eq!(config.lines.min_segment_samples, 5);
        assert_eq!(config.lines.min_samples, 10);
    }

    #[test]
    fn test_partial_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [smoothing]
            sigma = 2.0

            [lines]
            min_line_gap_ms = 250.0
            k = 2.5
            "#,
        )
        .expect("parse");

        assert_eq!(config.smoothing.sigma, 2.0);
        assert_eq!(config.lines.min_line_gap_ms, 250.0);
        assert_eq!(config.lines.k, 2.5);
        // untouched fields keep their defaults
        assert_eq!(config.lines.gap_ms, 120.0);
        assert!(config.lines.expand_one_sample);
        assert_eq!(config.lines.min_displacement_px, 100.0);
        assert_eq!(config.classify.fixation_velocity, 0.5);
    }

    #[test]
    fn test_bad_toml() {
        assert!(PipelineConfig::from_toml_str("smoothing = 3").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[classify]\nfixation_velocity = 0.8\n").expect("write");

        let config = PipelineConfig::resolve(Some(&path)).expect("load");
        assert_eq!(config.classify.fixation_velocity, 0.8);
    }
}
