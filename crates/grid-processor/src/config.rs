//! Configuration for the resampler.

use serde::{Deserialize, Serialize};

/// Configuration for scattered resampling and the weight cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Number of (source points, target grid) weight sets kept in memory.
    pub cache_capacity: usize,

    /// Compute interpolation weights in parallel over target rows.
    pub parallel: bool,

    /// Bucket size of the triangle lookup index, in source points per bucket.
    pub points_per_bucket: usize,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 8,
            parallel: true,
            points_per_bucket: 4,
        }
    }
}

impl ResamplerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RESAMPLER_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.cache_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("RESAMPLER_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("RESAMPLER_POINTS_PER_BUCKET") {
            if let Ok(n) = val.parse() {
                config.points_per_bucket = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        if self.points_per_bucket == 0 {
            return Err("points_per_bucket must be > 0".to_string());
        }

        Ok(())
    }
}
