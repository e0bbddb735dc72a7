//! Configuration for dataset assembly and persistence.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use ingestion::ConcentrationProduct;
use seaice_common::PrepError;
use serde::{Deserialize, Serialize};

/// How assembled frames are turned into samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Full-grid tensors, masked cells zeroed.
    Entire,
    /// One square window per unmasked interior cell.
    Cell,
    /// Windows flattened to feature vectors, fully ice-covered windows only.
    Table,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Entire => "entire",
            Layout::Cell => "cell",
            Layout::Table => "table",
        }
    }
}

impl FromStr for Layout {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entire" => Ok(Layout::Entire),
            "cell" => Ok(Layout::Cell),
            "table" => Ok(Layout::Table),
            other => Err(PrepError::configuration(format!("unknown layout: {}", other))),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the input and output sea-ice concentration channels come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationOrigin {
    /// The reanalysis `siconc` field.
    Reanalysis,
    /// A satellite concentration product.
    Satellite(ConcentrationProduct),
}

impl FromStr for ConcentrationOrigin {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reanalysis" | "era5" => Ok(ConcentrationOrigin::Reanalysis),
            other => other.parse().map(ConcentrationOrigin::Satellite),
        }
    }
}

impl fmt::Display for ConcentrationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcentrationOrigin::Reanalysis => f.write_str("reanalysis"),
            ConcentrationOrigin::Satellite(product) => write!(f, "satellite:{}", product),
        }
    }
}

/// Configuration of the dataset assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    pub layout: Layout,

    /// Half-width of the cell/table window; windows are `2w+1` cells wide.
    pub window: usize,

    /// Abort on the first failed time index instead of skipping it.
    pub strict: bool,

    /// Build frames for different time indices on the rayon pool.
    pub parallel: bool,

    pub concentration: ConcentrationOrigin,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Entire,
            window: 1,
            strict: false,
            parallel: false,
            concentration: ConcentrationOrigin::Reanalysis,
        }
    }
}

impl AssemblyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ASSEMBLY_LAYOUT") {
            if let Ok(layout) = val.parse() {
                config.layout = layout;
            }
        }

        if let Ok(val) = std::env::var("ASSEMBLY_WINDOW") {
            if let Ok(w) = val.parse() {
                config.window = w;
            }
        }

        if let Ok(val) = std::env::var("ASSEMBLY_STRICT") {
            config.strict = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("ASSEMBLY_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("ASSEMBLY_CONCENTRATION") {
            if let Ok(origin) = val.parse() {
                config.concentration = origin;
            }
        }

        config
    }

    /// Side length of one window.
    pub fn window_size(&self) -> usize {
        2 * self.window + 1
    }
}

/// Configuration of the on-disk dataset store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding named datasets.
    pub root: PathBuf,

    /// Replace an existing dataset directory instead of failing.
    pub overwrite: bool,

    /// Samples per Zarr chunk along the leading axis.
    pub chunk_samples: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./datasets"),
            overwrite: false,
            chunk_samples: 1,
        }
    }
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("STORE_ROOT") {
            config.root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("STORE_OVERWRITE") {
            config.overwrite = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("STORE_CHUNK_SAMPLES") {
            if let Ok(n) = val.parse() {
                config.chunk_samples = n;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_samples == 0 {
            return Err("chunk_samples must be > 0".to_string());
        }
        Ok(())
    }
}
