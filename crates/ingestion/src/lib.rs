//! Source adapters for the sea-ice training pipeline.
//!
//! Turns the three raw product families into fields on the common target
//! grid:
//!
//! - Ice motion (cm/s on its own EASE grid) → smoothed km/day, and the grid
//!   itself
//! - Sea-ice concentration (swath percent or daily fraction) → fraction
//! - Atmospheric reanalysis (regular lat/lon) → t2m, rotated 10 m wind and
//!   ice cover
//!
//! Raw container parsing is delegated to the collaborator traits in
//! [`sources`].

pub mod concentration;
pub mod config;
pub mod motion;
pub mod normalize;
pub mod reanalysis;
pub mod sources;

// Re-exports
pub use concentration::{ConcentrationAdapter, ConcentrationProduct};
pub use config::SourceConfig;
pub use motion::{IceMotionAdapter, MotionFrame};
pub use reanalysis::{ReanalysisAdapter, ReanalysisFields};
pub use sources::{
    ConcentrationReader, ConcentrationSource, DirectoryConcentrationSource, InMemoryConcentration,
    InMemoryMotion, InMemoryReanalysis, MotionHandle, MotionStore, NativeConcentration,
    ReanalysisSource,
};
