//! NSIDC Sea Ice Polar Stereographic projections.
//!
//! EPSG:3411 (north) and EPSG:3412 (south) are ellipsoidal polar
//! stereographic projections on the Hughes 1980 ellipsoid with true scale at
//! ±70° latitude. The north grid is rotated so that 45°W points down the
//! y axis; the south grid uses Greenwich.
//!
//! Equations follow Snyder (1987) §21, using the series inverse for the
//! conformal latitude. The south aspect is evaluated by negating latitude,
//! longitudes and both coordinates of the north formulas.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::Pole;

/// Hughes 1980 ellipsoid semi-major axis (meters).
pub const HUGHES_SEMI_MAJOR: f64 = 6_378_273.0;
/// Hughes 1980 ellipsoid semi-minor axis (meters).
pub const HUGHES_SEMI_MINOR: f64 = 6_356_889.449;

/// Ellipsoidal polar stereographic projection parameters.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    pub pole: Pole,
    /// Latitude of true scale in degrees (signed)
    pub lat_ts: f64,
    /// Central meridian in degrees
    pub lon0: f64,
    /// Semi-major axis (meters)
    pub semi_major: f64,
    /// First eccentricity
    eccentricity: f64,
    /// `m(φc) / t(φc)`, the scale term shared by forward and inverse
    scale: f64,
}

impl PolarStereographic {
    /// Create a projection from its defining parameters.
    pub fn new(pole: Pole, lat_ts: f64, lon0: f64, semi_major: f64, semi_minor: f64) -> Self {
        let e2 = 1.0 - (semi_minor / semi_major).powi(2);
        let eccentricity = e2.sqrt();

        // Work in the north aspect; the south is mirrored.
        let phi_c = match pole {
            Pole::North => lat_ts.to_radians(),
            Pole::South => -lat_ts.to_radians(),
        };
        let scale = m(phi_c, eccentricity) / t(phi_c, eccentricity);

        Self {
            pole,
            lat_ts,
            lon0,
            semi_major,
            eccentricity,
            scale,
        }
    }

    /// EPSG:3411, NSIDC Sea Ice Polar Stereographic North.
    pub fn nsidc_north() -> Self {
        Self::new(Pole::North, 70.0, -45.0, HUGHES_SEMI_MAJOR, HUGHES_SEMI_MINOR)
    }

    /// EPSG:3412, NSIDC Sea Ice Polar Stereographic South.
    pub fn nsidc_south() -> Self {
        Self::new(Pole::South, -70.0, 0.0, HUGHES_SEMI_MAJOR, HUGHES_SEMI_MINOR)
    }

    /// Convert geographic coordinates (degrees) to projected meters.
    pub fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let e = self.eccentricity;
        let dlon = (lon_deg - self.lon0).to_radians();

        match self.pole {
            Pole::North => {
                let rho = self.semi_major * self.scale * t(lat_deg.to_radians(), e);
                (rho * dlon.sin(), -rho * dlon.cos())
            }
            Pole::South => {
                let rho = self.semi_major * self.scale * t(-lat_deg.to_radians(), e);
                (rho * dlon.sin(), rho * dlon.cos())
            }
        }
    }

    /// Convert projected meters back to geographic (lat, lon) degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let e = self.eccentricity;
        let rho = x.hypot(y);
        let t_val = rho / (self.semi_major * self.scale);
        let chi = FRAC_PI_2 - 2.0 * t_val.atan();
        let phi = conformal_to_geodetic(chi, e);

        let (lat, dlon) = match self.pole {
            Pole::North => (phi, x.atan2(-y)),
            Pole::South => (-phi, x.atan2(y)),
        };

        (lat.to_degrees(), normalize_lon(self.lon0 + dlon.to_degrees()))
    }
}

/// Snyder eq. 15-9.
fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Snyder eq. 14-15.
fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

/// Snyder eq. 3-5, series form.
fn conformal_to_geodetic(chi: f64, e: f64) -> f64 {
    let e2 = e * e;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let e8 = e4 * e4;

    chi + (e2 / 2.0 + 5.0 * e4 / 24.0 + e6 / 12.0 + 13.0 * e8 / 360.0) * (2.0 * chi).sin()
        + (7.0 * e4 / 48.0 + 29.0 * e6 / 240.0 + 811.0 * e8 / 11520.0) * (4.0 * chi).sin()
        + (7.0 * e6 / 120.0 + 81.0 * e8 / 1120.0) * (6.0 * chi).sin()
        + (4279.0 * e8 / 161280.0) * (8.0 * chi).sin()
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon_deg: f64) -> f64 {
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped.is_nan() {
        lon_deg
    } else {
        wrapped
    }
}
