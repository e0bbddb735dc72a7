//! Source configuration: where the products live and how they are read.
//!
//! Every adapter receives an explicit `SourceConfig`; there is no global
//! data path.

use std::path::PathBuf;

use chrono::NaiveDate;
use seaice_common::Region;
use serde::{Deserialize, Serialize};

/// Location and read settings for all source products of one region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory containing one sub-directory per region (`NH`, `SH`).
    pub data_root: PathBuf,

    /// Hemispheric domain.
    pub region: Region,

    /// Standard deviation (grid cells) of the Gaussian applied to ice motion.
    pub smoothing_sigma: f64,

    /// Keep every n-th row and column of the motion grid.
    pub sampling_stride: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            region: Region::North,
            smoothing_sigma: 3.0,
            sampling_stride: 1,
        }
    }
}

impl SourceConfig {
    /// Create a configuration for a data root and region with default
    /// read settings.
    pub fn new(data_root: impl Into<PathBuf>, region: Region) -> Self {
        Self {
            data_root: data_root.into(),
            region,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SEAICE_DATA_ROOT") {
            config.data_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("SEAICE_REGION") {
            if let Ok(region) = val.parse() {
                config.region = region;
            }
        }

        if let Ok(val) = std::env::var("SEAICE_SMOOTHING_SIGMA") {
            if let Ok(sigma) = val.parse() {
                config.smoothing_sigma = sigma;
            }
        }

        if let Ok(val) = std::env::var("SEAICE_SAMPLING_STRIDE") {
            if let Ok(stride) = val.parse() {
                config.sampling_stride = stride;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.sampling_stride == 0 {
            return Err("sampling_stride must be > 0".to_string());
        }

        if !self.smoothing_sigma.is_finite() || self.smoothing_sigma < 0.0 {
            return Err("smoothing_sigma must be a finite value >= 0".to_string());
        }

        Ok(())
    }

    /// `{root}/{REGION}`
    pub fn region_dir(&self) -> PathBuf {
        self.data_root.join(self.region.tag())
    }

    /// Yearly ice-motion file.
    pub fn motion_path(&self, year: i32) -> PathBuf {
        self.region_dir().join("Sea_ice_drift").join(format!(
            "icemotion_daily_{}_25km_{year}0101_{year}1231_v4.1.nc",
            self.region.file_tag(),
            year = year
        ))
    }

    /// Daily passive-microwave swath concentration file.
    pub fn swath_concentration_path(&self, date: NaiveDate) -> PathBuf {
        self.region_dir().join("SIC").join(format!(
            "AMSR_U2_L3_SeaIce25km_B04_{}.he5",
            date.format("%Y%m%d")
        ))
    }

    /// Daily analysis (climate data record) concentration file.
    pub fn daily_concentration_path(&self, date: NaiveDate) -> PathBuf {
        self.region_dir().join("SIC_NOAA").join(format!(
            "seaice_conc_daily_{}_{}_f17_v04r00.nc",
            self.region.tag(),
            date.format("%Y%m%d")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();
        assert_eq!(config.region, Region::North);
        assert_eq!(config.smoothing_sigma, 3.0);
        assert_eq!(config.sampling_stride, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SourceConfig::default();
        config.sampling_stride = 0;
        assert!(config.validate().is_err());

        config = SourceConfig::default();
        config.smoothing_sigma = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paths() {
        let config = SourceConfig::new("/data", Region::South);
        let date = NaiveDate::from_ymd_opt(2021, 3, 7).unwrap();

        assert_eq!(
            config.motion_path(2021),
            PathBuf::from("/data/SH/Sea_ice_drift/icemotion_daily_sh_25km_20210101_20211231_v4.1.nc")
        );
        assert_eq!(
            config.swath_concentration_path(date),
            PathBuf::from("/data/SH/SIC/AMSR_U2_L3_SeaIce25km_B04_20210307.he5")
        );
        assert_eq!(
            config.daily_concentration_path(date),
            PathBuf::from("/data/SH/SIC_NOAA/seaice_conc_daily_SH_20210307_f17_v04r00.nc")
        );
    }
}
