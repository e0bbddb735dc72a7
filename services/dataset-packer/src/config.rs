//! Packer configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use training_data::{CropWindow, PackMode};

/// What the packer produces from a stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Sequence (separate time axis) or multi-frame (stacked channels)
    pub mode: PackMode,

    /// Consecutive frames per example
    pub horizon: usize,

    /// Crop applied to every frame. When absent: the reference 320x320
    /// crop if it fits the grid, else the whole grid
    pub crop: Option<CropWindow>,

    /// Encode to 16-bit before packing
    pub quantize: bool,

    /// Replace an existing output directory
    pub overwrite: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            mode: PackMode::Sequence,
            horizon: 3,
            crop: None,
            quantize: false,
            overwrite: false,
        }
    }
}

impl PackerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PACKER_HORIZON` and `PACKER_MODE` when set and parseable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(horizon) = env::var("PACKER_HORIZON").ok().and_then(|v| v.parse().ok()) {
            self.horizon = horizon;
        }
        if let Some(mode) = env::var("PACKER_MODE").ok().and_then(|v| v.parse().ok()) {
            self.mode = mode;
        }
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.horizon == 0 {
            return Err("horizon must be at least 1".to_string());
        }
        if let Some(crop) = &self.crop {
            if crop.rows == 0 || crop.cols == 0 {
                return Err("crop must be non-empty".to_string());
            }
        }
        Ok(())
    }

    /// The crop for a grid of `(rows, cols)`.
    pub fn crop_for(&self, grid_shape: (usize, usize)) -> CropWindow {
        let (rows, cols) = grid_shape;
        self.crop.unwrap_or_else(|| {
            let reference = CropWindow::default();
            if reference.check(rows, cols).is_ok() {
                reference
            } else {
                CropWindow::full(rows, cols)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PackerConfig::default();
        assert_eq!(config.mode, PackMode::Sequence);
        assert_eq!(config.horizon, 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.crop_for((4, 5)), CropWindow::full(4, 5));
    }

    #[test]
    fn test_reference_crop_used_when_it_fits() {
        let config = PackerConfig::default();
        assert_eq!(config.crop_for((361, 361)), CropWindow::default());
        assert_eq!(config.crop_for((361, 319)), CropWindow::full(361, 319));

        let explicit = PackerConfig {
            crop: Some(CropWindow::new(0, 0, 2, 2)),
            ..PackerConfig::default()
        };
        assert_eq!(explicit.crop_for((361, 361)), CropWindow::new(0, 0, 2, 2));
    }

    #[test]
    fn test_yaml_config() {
        let yaml = "mode: multiframe\nhorizon: 2\ncrop:\n  row_start: 1\n  col_start: 0\n  rows: 2\n  cols: 3\nquantize: true\n";
        let config: PackerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mode, PackMode::Multiframe);
        assert_eq!(config.horizon, 2);
        assert_eq!(config.crop, Some(CropWindow::new(1, 0, 2, 3)));
        assert!(config.quantize);
        assert!(!config.overwrite);
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packer.yaml");
        std::fs::write(&path, "horizon: 5\n").unwrap();
        let config = PackerConfig::from_file(&path).unwrap();
        assert_eq!(config.horizon, 5);
        assert_eq!(config.mode, PackMode::Sequence);

        assert!(PackerConfig::from_file(dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_validation() {
        let config = PackerConfig {
            horizon: 0,
            ..PackerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PackerConfig {
            crop: Some(CropWindow::new(0, 0, 0, 4)),
            ..PackerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
