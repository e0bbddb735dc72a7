//! Separable Gaussian smoothing of 2-D fields.
//!
//! The kernel is truncated at `4σ`, normalised to unit sum, and the field
//! is extended by half-sample reflection (`d c b a | a b c d | d c b a`).

use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};

/// Kernel half-width is `round(TRUNCATE * sigma)`.
pub const TRUNCATE: f64 = 4.0;

/// Normalised 1-D Gaussian weights for offsets `-radius..=radius`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as usize;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-(x * x) / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Smooth a field with an isotropic Gaussian of standard deviation `sigma`
/// grid cells. A non-positive sigma returns the field unchanged.
pub fn gaussian_filter(field: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if sigma.is_nan() || sigma <= 0.0 || field.is_empty() {
        return field.clone();
    }
    let kernel = gaussian_kernel(sigma);

    let mut rows_done = field.clone();
    for (src, dst) in field.lanes(Axis(0)).into_iter().zip(rows_done.lanes_mut(Axis(0))) {
        convolve_lane(src, dst, &kernel);
    }

    let mut out = rows_done.clone();
    for (src, dst) in rows_done.lanes(Axis(1)).into_iter().zip(out.lanes_mut(Axis(1))) {
        convolve_lane(src, dst, &kernel);
    }
    out
}

fn convolve_lane(src: ArrayView1<f64>, mut dst: ArrayViewMut1<f64>, kernel: &[f64]) {
    let n = src.len();
    let radius = (kernel.len() / 2) as isize;
    for i in 0..n {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let j = reflect(i as isize + k as isize - radius, n);
            acc += w * src[j];
        }
        dst[i] = acc;
    }
}

/// Map an out-of-range index back into `0..n` by half-sample reflection.
fn reflect(idx: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = idx.rem_euclid(period);
    if m >= n as isize {
        (period - m - 1) as usize
    } else {
        m as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_kernel_shape() {
        let k = gaussian_kernel(3.0);
        assert_eq!(k.len(), 25);
        assert_abs_diff_eq!(k.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(k[0], k[24], epsilon = 1e-15);
        assert!(k[12] > k[11]);
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-4, 4), 3);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(7, 4), 0);
        assert_eq!(reflect(8, 4), 0);
        assert_eq!(reflect(2, 4), 2);
        // Lanes shorter than the kernel reflect repeatedly
        assert_eq!(reflect(-5, 2), 0);
    }

    #[test]
    fn test_constant_field_is_preserved() {
        let field = Array2::from_elem((7, 5), 2.5);
        let out = gaussian_filter(&field, 3.0);
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mass_conserved_and_spread() {
        // Reflection conserves the sum for an impulse far from the edges
        let mut field = Array2::zeros((41, 41));
        field[[20, 20]] = 1.0;
        let out = gaussian_filter(&field, 3.0);
        assert_abs_diff_eq!(out.sum(), 1.0, epsilon = 1e-12);
        assert!(out[[20, 20]] < 1.0);
        assert!(out[[20, 23]] > 0.0);
        assert_abs_diff_eq!(out[[17, 20]], out[[20, 23]], epsilon = 1e-15);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let field = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as f64);
        assert_eq!(gaussian_filter(&field, 0.0), field);
    }
}
