//! Coordinate reference system transformations for the polar domains.
//!
//! Implements the EASE-Grid and NSIDC polar stereographic projections from
//! scratch, plus the registry that pairs each data source with its native
//! and target CRS.

pub mod ease;
pub mod polar_stereographic;
pub mod registry;
pub mod rotation;

pub use ease::EaseGrid;
pub use polar_stereographic::PolarStereographic;
pub use registry::{CrsTransform, Projection, ProjectionRegistry};
pub use rotation::{rotate_field, rotate_vector};

/// Hemisphere of a polar projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pole {
    North,
    South,
}
