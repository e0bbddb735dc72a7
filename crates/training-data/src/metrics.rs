//! NaN-aware comparison metrics between two grids.

use ndarray::{ArrayBase, Data, Dimension};
use num_traits::Float;
use seaice_common::{PrepError, PrepResult};

fn check_shapes(a: &[usize], b: &[usize]) -> PrepResult<()> {
    if a != b {
        return Err(PrepError::shape_mismatch(format!(
            "cannot compare arrays of shape {:?} and {:?}",
            a, b
        )));
    }
    Ok(())
}

/// Pairs where neither value is NaN, widened to f64.
fn valid_pairs<A, S, D>(a: &ArrayBase<S, D>, b: &ArrayBase<S, D>) -> Vec<(f64, f64)>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .filter_map(|(x, y)| Some((x.to_f64()?, y.to_f64()?)))
        .collect()
}

/// Mean absolute error over the positions where both arrays are defined.
///
/// Returns NaN when no position is defined.
pub fn mae<A, S, D>(observed: &ArrayBase<S, D>, predicted: &ArrayBase<S, D>) -> PrepResult<f64>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    check_shapes(observed.shape(), predicted.shape())?;
    let pairs = valid_pairs(observed, predicted);
    if pairs.is_empty() {
        return Ok(f64::NAN);
    }
    let total: f64 = pairs.iter().map(|(o, p)| (o - p).abs()).sum();
    Ok(total / pairs.len() as f64)
}

/// Pearson correlation over the positions where both arrays are defined.
///
/// Returns NaN with fewer than two defined positions or when either side
/// has zero variance.
pub fn corr<A, S, D>(predicted: &ArrayBase<S, D>, observed: &ArrayBase<S, D>) -> PrepResult<f64>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    check_shapes(predicted.shape(), observed.shape())?;
    let pairs = valid_pairs(predicted, observed);
    if pairs.len() < 2 {
        return Ok(f64::NAN);
    }

    let n = pairs.len() as f64;
    let mean_p = pairs.iter().map(|(p, _)| p).sum::<f64>() / n;
    let mean_o = pairs.iter().map(|(_, o)| o).sum::<f64>() / n;
    let (mut cov, mut var_p, mut var_o) = (0.0, 0.0, 0.0);
    for (p, o) in &pairs {
        let dp = p - mean_p;
        let dobs = o - mean_o;
        cov += dp * dobs;
        var_p += dp * dp;
        var_o += dobs * dobs;
    }
    if var_p == 0.0 || var_o == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(cov / (var_p.sqrt() * var_o.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_mae_ignores_nan() {
        let observed = array![[1.0, 2.0], [f64::NAN, 4.0]];
        let predicted = array![[1.5, 2.0], [3.0, f64::NAN]];
        assert_abs_diff_eq!(mae(&observed, &predicted).unwrap(), 0.25);
    }

    #[test]
    fn test_mae_all_nan() {
        let a = Array2::from_elem((2, 2), f64::NAN);
        assert!(mae(&a, &a).unwrap().is_nan());
    }

    #[test]
    fn test_corr_of_self_is_one() {
        let x = array![[0.1_f32, 0.4, 0.2], [0.9, f32::NAN, 0.3]];
        assert_abs_diff_eq!(corr(&x, &x).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corr_excludes_nan_from_both() {
        let predicted = array![1.0, 2.0, 3.0, f64::NAN];
        let observed = array![2.0, 4.0, f64::NAN, 100.0];
        // Only the first two positions remain: perfectly correlated
        assert_abs_diff_eq!(corr(&predicted, &observed).unwrap(), 1.0, epsilon = 1e-12);

        let anti = array![3.0, 2.0, 1.0, 0.0];
        let rising = array![0.0, 1.0, 2.0, 3.0];
        assert_abs_diff_eq!(corr(&anti, &rising).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corr_degenerate_cases() {
        let one = array![1.0, f64::NAN];
        assert!(corr(&one, &one).unwrap().is_nan());
        let flat = array![2.0, 2.0, 2.0];
        let rising = array![1.0, 2.0, 3.0];
        assert!(corr(&flat, &rising).unwrap().is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Array2::<f64>::zeros((2, 3));
        let b = Array2::<f64>::zeros((3, 2));
        assert!(matches!(mae(&a, &b), Err(PrepError::ShapeMismatch(_))));
        assert!(matches!(corr(&a, &b), Err(PrepError::ShapeMismatch(_))));
    }
}
