//! Resampling of scattered source data onto the polar target mesh.
//!
//! Every source product arrives on its own native grid. Once its
//! coordinates have been transformed into the target CRS they are treated
//! as a scattered point cloud and interpolated linearly onto the target
//! grid:
//!
//! ```text
//! source (x, y, value)
//!      │
//!      ▼
//! ResamplerCache::get_or_build(x, y, grid)
//!      │
//!      ├─► Cache hit: shared Arc<ScatteredResampler>
//!      │
//!      └─► Cache miss: Delaunay triangulation + per-cell barycentric weights
//!               │
//!               ▼
//!      ScatteredResampler::apply(values) -> Array2 (NaN outside the hull)
//! ```
//!
//! The crate also provides the Gaussian filter used to smooth ice motion.

pub mod cache;
pub mod config;
pub mod error;
pub mod resample;
pub mod smoothing;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, ResamplerCache, ResamplerKey};
pub use config::ResamplerConfig;
pub use error::{GridProcessorError, Result};
pub use resample::{resample, source_fingerprint, Barycentric, ScatteredResampler};
pub use smoothing::{gaussian_filter, gaussian_kernel};
