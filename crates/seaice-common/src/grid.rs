//! The fixed target mesh every source is resampled onto.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ndarray::{s, Array2};

use crate::crs::CrsCode;
use crate::error::{PrepError, PrepResult};

/// An immutable pair of 2-D coordinate arrays in a projected CRS.
///
/// `x[[row, col]]` and `y[[row, col]]` give the coordinate of cell
/// `(row, col)`. The row/col order is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    x: Array2<f64>,
    y: Array2<f64>,
    crs: CrsCode,
}

impl TargetGrid {
    /// Build a grid from 1-D axes (meshgrid semantics: `x` varies along
    /// columns, `y` along rows).
    pub fn from_axes(xs: &[f64], ys: &[f64], crs: CrsCode) -> Self {
        let rows = ys.len();
        let cols = xs.len();
        let x = Array2::from_shape_fn((rows, cols), |(_, c)| xs[c]);
        let y = Array2::from_shape_fn((rows, cols), |(r, _)| ys[r]);
        Self { x, y, crs }
    }

    /// Build a grid from explicit 2-D coordinate arrays.
    pub fn from_coordinates(x: Array2<f64>, y: Array2<f64>, crs: CrsCode) -> PrepResult<Self> {
        if x.dim() != y.dim() {
            return Err(PrepError::shape_mismatch(format!(
                "grid x shape {:?} does not match y shape {:?}",
                x.dim(),
                y.dim()
            )));
        }
        Ok(Self { x, y, crs })
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn cols(&self) -> usize {
        self.x.ncols()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Coordinate of a cell, or `None` outside the grid.
    pub fn coord(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        Some((*self.x.get((row, col))?, *self.y.get((row, col))?))
    }

    /// Keep every `stride`-th row and column.
    pub fn subsample(&self, stride: usize) -> Self {
        let stride = stride.max(1) as isize;
        Self {
            x: self.x.slice(s![..;stride, ..;stride]).to_owned(),
            y: self.y.slice(s![..;stride, ..;stride]).to_owned(),
            crs: self.crs,
        }
    }

    /// Check that a field is aligned with this grid.
    pub fn check_field(&self, name: &str, field: &Array2<f64>) -> PrepResult<()> {
        if field.dim() != self.shape() {
            return Err(PrepError::shape_mismatch(format!(
                "field '{}' has shape {:?}, grid is {:?}",
                name,
                field.dim(),
                self.shape()
            )));
        }
        Ok(())
    }

    /// Stable hash of shape, CRS and every coordinate.
    ///
    /// Used to key cached interpolation weights.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.shape().hash(&mut hasher);
        self.crs.hash(&mut hasher);
        for v in self.x.iter().chain(self.y.iter()) {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_axes_is_meshgrid() {
        let grid = TargetGrid::from_axes(&[0.0, 10.0, 20.0], &[5.0, -5.0], CrsCode::Epsg3408);
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.coord(0, 2), Some((20.0, 5.0)));
        assert_eq!(grid.coord(1, 0), Some((0.0, -5.0)));
        assert_eq!(grid.coord(2, 0), None);
    }

    #[test]
    fn test_from_coordinates_rejects_mismatch() {
        let x = Array2::zeros((2, 3));
        let y = Array2::zeros((3, 2));
        assert!(TargetGrid::from_coordinates(x, y, CrsCode::Epsg3409).is_err());
    }

    #[test]
    fn test_subsample() {
        let xs: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let grid = TargetGrid::from_axes(&xs, &xs, CrsCode::Epsg3408);
        let sub = grid.subsample(2);
        assert_eq!(sub.shape(), (3, 3));
        assert_eq!(sub.coord(1, 2), Some((4.0, 2.0)));
    }

    #[test]
    fn test_fingerprint_changes_with_coordinates() {
        let a = TargetGrid::from_axes(&[0.0, 1.0], &[0.0, 1.0], CrsCode::Epsg3408);
        let b = TargetGrid::from_axes(&[0.0, 2.0], &[0.0, 1.0], CrsCode::Epsg3408);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
