//! EASE-Grid (original) polar projections.
//!
//! EPSG:3408 (north) and EPSG:3409 (south) are the polar aspects of the
//! Lambert azimuthal equal-area projection on a sphere of radius
//! 6 371 228 m, centred on the pole with the Greenwich meridian pointing
//! down (north) or up (south) the y axis.
//!
//! Forward equations (Snyder, Map Projections: A Working Manual, 24-3/24-4):
//!
//! - North: `x = 2R sin(π/4 − φ/2) sin λ`, `y = −2R sin(π/4 − φ/2) cos λ`
//! - South: `x = 2R cos(π/4 − φ/2) sin λ`, `y =  2R cos(π/4 − φ/2) cos λ`

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::Pole;

/// Radius of the EASE-Grid authalic sphere (meters).
pub const EASE_RADIUS: f64 = 6_371_228.0;

/// Lambert azimuthal equal-area projection, polar aspect.
#[derive(Debug, Clone)]
pub struct EaseGrid {
    /// Which pole the projection is centred on
    pub pole: Pole,
    /// Sphere radius (meters)
    pub radius: f64,
}

impl EaseGrid {
    /// EPSG:3408, NSIDC EASE-Grid North.
    pub fn north() -> Self {
        Self {
            pole: Pole::North,
            radius: EASE_RADIUS,
        }
    }

    /// EPSG:3409, NSIDC EASE-Grid South.
    pub fn south() -> Self {
        Self {
            pole: Pole::South,
            radius: EASE_RADIUS,
        }
    }

    /// Convert geographic coordinates (degrees) to projected meters.
    pub fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let phi = lat_deg.to_radians();
        let lambda = lon_deg.to_radians();
        let two_r = 2.0 * self.radius;

        match self.pole {
            Pole::North => {
                let rho = two_r * (FRAC_PI_4 - phi / 2.0).sin();
                (rho * lambda.sin(), -rho * lambda.cos())
            }
            Pole::South => {
                let rho = two_r * (FRAC_PI_4 - phi / 2.0).cos();
                (rho * lambda.sin(), rho * lambda.cos())
            }
        }
    }

    /// Convert projected meters back to geographic (lat, lon) degrees.
    ///
    /// Returns `None` for points farther from the pole than the antipode.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let rho = x.hypot(y);
        let ratio = rho / (2.0 * self.radius);
        if !(0.0..=1.0).contains(&ratio) {
            return None;
        }

        let (phi, lambda) = match self.pole {
            Pole::North => (FRAC_PI_2 - 2.0 * ratio.asin(), x.atan2(-y)),
            Pole::South => (FRAC_PI_2 - 2.0 * ratio.acos(), x.atan2(y)),
        };

        Some((phi.to_degrees(), lambda.to_degrees()))
    }
}
