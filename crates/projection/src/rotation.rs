//! Rotation of east/north vector components into a polar grid frame.
//!
//! The angle is the longitude of each point, so a wind vector expressed in
//! geographic east/north components ends up aligned with the projected
//! x/y axes.

use ndarray::{Array2, Zip};
use seaice_common::{PrepError, PrepResult};

/// Rotate a single vector by `lon_deg` degrees.
#[inline]
pub fn rotate_vector(u: f64, v: f64, lon_deg: f64) -> (f64, f64) {
    let (sin, cos) = lon_deg.to_radians().sin_cos();
    (u * cos - v * sin, u * sin + v * cos)
}

/// Rotate whole fields, each cell by its own longitude.
pub fn rotate_field(
    u: &Array2<f64>,
    v: &Array2<f64>,
    lon: &Array2<f64>,
) -> PrepResult<(Array2<f64>, Array2<f64>)> {
    if u.dim() != v.dim() || u.dim() != lon.dim() {
        return Err(PrepError::shape_mismatch(format!(
            "rotation inputs disagree: u {:?}, v {:?}, lon {:?}",
            u.dim(),
            v.dim(),
            lon.dim()
        )));
    }

    let mut ru = Array2::zeros(u.dim());
    let mut rv = Array2::zeros(u.dim());
    Zip::from(&mut ru)
        .and(&mut rv)
        .and(u)
        .and(v)
        .and(lon)
        .for_each(|ru, rv, &u, &v, &lon| {
            let (a, b) = rotate_vector(u, v, lon);
            *ru = a;
            *rv = b;
        });
    Ok((ru, rv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_angle_is_identity() {
        let (u, v) = rotate_vector(3.0, -4.0, 0.0);
        assert_abs_diff_eq!(u, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v, -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_turn() {
        let (u, v) = rotate_vector(1.0, 0.0, 90.0);
        assert_abs_diff_eq!(u, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angles_compose_additively() {
        for (a, b) in [(10.0, 25.0), (-135.0, 60.0), (179.0, 179.0)] {
            let (u1, v1) = rotate_vector(2.5, -1.5, a);
            let (u2, v2) = rotate_vector(u1, v1, b);
            let (u3, v3) = rotate_vector(2.5, -1.5, a + b);
            assert_abs_diff_eq!(u2, u3, epsilon = 1e-12);
            assert_abs_diff_eq!(v2, v3, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_preserves_magnitude() {
        let (u, v) = rotate_vector(3.0, 4.0, 37.0);
        assert_abs_diff_eq!(u.hypot(v), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_field() {
        let u = Array2::from_elem((2, 2), 1.0);
        let v = Array2::zeros((2, 2));
        let lon = Array2::from_shape_vec((2, 2), vec![0.0, 90.0, 180.0, -90.0]).unwrap();
        let (ru, rv) = rotate_field(&u, &v, &lon).unwrap();
        assert_abs_diff_eq!(ru[[0, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rv[[0, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ru[[1, 0]], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rv[[1, 1]], -1.0, epsilon = 1e-12);

        let bad = Array2::zeros((3, 2));
        assert!(rotate_field(&u, &v, &bad).is_err());
    }
}
