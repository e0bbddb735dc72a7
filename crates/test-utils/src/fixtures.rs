//! Named constants for the synthetic Arctic scenario.
//!
//! The scenario is a small EASE-Grid North mesh centred on 75°N 0°E with a
//! reanalysis patch covering it. The south-west quarter of the mesh (lower
//! rows, western columns) is ice-free; everything else is fully covered.

/// Target mesh.
pub mod mesh {
    /// Latitude of the mesh centre on the Greenwich meridian.
    pub const CENTER_LAT: f64 = 75.0;
    /// Spacing of the motion product (m).
    pub const CELL_SIZE: f64 = 25_000.0;
}

/// Reanalysis patch: a regular latitude/longitude lattice.
pub mod patch {
    pub const LAT_START: f64 = 74.0;
    pub const LON_START: f64 = -3.0;
    pub const STEP: f64 = 0.05;
    pub const LAT_COUNT: usize = 41;
    pub const LON_COUNT: usize = 121;

    /// Cells south of this latitude and west of [`ICE_FREE_LON_BELOW`] are
    /// ice-free. Both lie halfway between lattice lines.
    pub const ICE_FREE_LAT_BELOW: f64 = 74.975;
    pub const ICE_FREE_LON_BELOW: f64 = -0.025;
}

/// Physical values of the scenario fields.
pub mod values {
    /// 2020-01-01 in days since 1970-01-01.
    pub const FIRST_DAY: f64 = 18_262.0;
    /// Uniform eastward drift (cm/s); the northward component is its
    /// negation.
    pub const DRIFT_CM_PER_S: f64 = 10.0;
    /// The same speed in km/day.
    pub const DRIFT_KM_PER_DAY: f64 = 8.64;
    pub const AIR_TEMPERATURE_K: f64 = 260.0;
    pub const WIND_M_PER_S: f64 = 0.0;
}
