//! Common types and utilities shared across the sea-ice data preparation crates.

pub mod crs;
pub mod error;
pub mod grid;
pub mod time;

pub use crs::{CrsCode, Region, SourceKind};
pub use error::{PrepError, PrepResult};
pub use grid::TargetGrid;
pub use time::{date_to_offset, epoch, offset_to_date, DayAxis};
