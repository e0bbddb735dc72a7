//! Linear scattered-data interpolation onto a target grid.
//!
//! Source points are Delaunay-triangulated once; each target cell then
//! stores the three vertices of its containing triangle and the
//! barycentric weights of the cell centre. Applying the weights to a new
//! set of values is a single pass over the grid, so the same resampler can
//! be reused for every time step that shares the source coordinates.
//!
//! Cells outside the convex hull of the finite source points are NaN. A
//! NaN source value poisons every cell whose triangle touches it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use delaunator::{triangulate, Point};
use ndarray::Array2;
use rayon::prelude::*;
use seaice_common::TargetGrid;
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Relative tolerance for accepting a point on a triangle edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Containing triangle and barycentric weights of one target cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    /// Indices into the original (unfiltered) source arrays
    pub vertices: [usize; 3],
    pub weights: [f64; 3],
}

impl Barycentric {
    #[inline]
    fn apply(&self, values: &[f64]) -> f64 {
        self.weights[0] * values[self.vertices[0]]
            + self.weights[1] * values[self.vertices[1]]
            + self.weights[2] * values[self.vertices[2]]
    }
}

/// Precomputed interpolation weights from a scattered point set to a grid.
#[derive(Debug, Clone)]
pub struct ScatteredResampler {
    shape: (usize, usize),
    source_len: usize,
    cells: Vec<Option<Barycentric>>,
}

impl ScatteredResampler {
    /// Triangulate the source points and locate every target cell.
    pub fn new(src_x: &[f64], src_y: &[f64], grid: &TargetGrid) -> Result<Self> {
        Self::build(src_x, src_y, grid, true, 4)
    }

    /// Like [`ScatteredResampler::new`] with explicit parallelism and index
    /// bucket size.
    pub fn build(
        src_x: &[f64],
        src_y: &[f64],
        grid: &TargetGrid,
        parallel: bool,
        points_per_bucket: usize,
    ) -> Result<Self> {
        if src_x.len() != src_y.len() {
            return Err(GridProcessorError::LengthMismatch {
                points: src_x.len(),
                values: src_y.len(),
            });
        }

        // Triangulate finite points only, remembering where each came from.
        let mut points = Vec::with_capacity(src_x.len());
        let mut original = Vec::with_capacity(src_x.len());
        for (i, (&x, &y)) in src_x.iter().zip(src_y).enumerate() {
            if x.is_finite() && y.is_finite() {
                points.push(Point { x, y });
                original.push(i);
            }
        }

        let triangles = if points.len() >= 3 {
            triangulate(&points).triangles
        } else {
            Vec::new()
        };
        let index = TriangleIndex::new(&points, &triangles, points_per_bucket.max(1));

        let (rows, cols) = grid.shape();
        let (gx, gy) = (grid.x(), grid.y());
        let locate = |i: usize| -> Option<Barycentric> {
            let (r, c) = (i / cols, i % cols);
            let (px, py) = (gx[[r, c]], gy[[r, c]]);
            if !px.is_finite() || !py.is_finite() {
                return None;
            }
            index
                .locate(&points, &triangles, px, py)
                .map(|(tri, weights)| Barycentric {
                    vertices: [
                        original[triangles[3 * tri]],
                        original[triangles[3 * tri + 1]],
                        original[triangles[3 * tri + 2]],
                    ],
                    weights,
                })
        };

        let cells: Vec<Option<Barycentric>> = if parallel {
            (0..rows * cols).into_par_iter().map(locate).collect()
        } else {
            (0..rows * cols).map(locate).collect()
        };

        debug!(
            source_points = src_x.len(),
            finite_points = points.len(),
            triangles = triangles.len() / 3,
            defined_cells = cells.iter().filter(|c| c.is_some()).count(),
            rows,
            cols,
            "Built scattered resampler"
        );

        Ok(Self {
            shape: (rows, cols),
            source_len: src_x.len(),
            cells,
        })
    }

    /// Target grid shape (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of source points the weights refer to.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Number of target cells inside the convex hull.
    pub fn defined_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Weights of one target cell, `None` outside the hull.
    pub fn cell(&self, row: usize, col: usize) -> Option<Barycentric> {
        if row >= self.shape.0 || col >= self.shape.1 {
            return None;
        }
        self.cells[row * self.shape.1 + col]
    }

    /// Interpolate one set of source values (same order as the coordinates).
    pub fn apply(&self, values: &[f64]) -> Result<Array2<f64>> {
        if values.len() != self.source_len {
            return Err(GridProcessorError::LengthMismatch {
                points: self.source_len,
                values: values.len(),
            });
        }

        let data: Vec<f64> = self
            .cells
            .iter()
            .map(|cell| cell.map_or(f64::NAN, |b| b.apply(values)))
            .collect();
        Array2::from_shape_vec(self.shape, data)
            .map_err(|e| GridProcessorError::shape_mismatch(e.to_string()))
    }

    /// Interpolate a 2-D source field, flattened in row-major order.
    pub fn apply_field(&self, values: &Array2<f64>) -> Result<Array2<f64>> {
        let flat: Vec<f64> = values.iter().copied().collect();
        self.apply(&flat)
    }
}

/// One-shot resampling of `values` at `(src_x, src_y)` onto `grid`.
pub fn resample(
    src_x: &[f64],
    src_y: &[f64],
    values: &[f64],
    grid: &TargetGrid,
) -> Result<Array2<f64>> {
    if values.len() != src_x.len() {
        return Err(GridProcessorError::LengthMismatch {
            points: src_x.len(),
            values: values.len(),
        });
    }
    ScatteredResampler::new(src_x, src_y, grid)?.apply(values)
}

/// Hash of a source coordinate set, used as half of the cache key.
pub fn source_fingerprint(src_x: &[f64], src_y: &[f64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    src_x.len().hash(&mut hasher);
    for v in src_x.iter().chain(src_y) {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Uniform bucket grid over the triangulation's bounding box. Each bucket
/// lists the triangles whose bounding boxes overlap it.
struct TriangleIndex {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    cell_w: f64,
    cell_h: f64,
    nx: usize,
    ny: usize,
    buckets: Vec<Vec<usize>>,
}

impl TriangleIndex {
    fn new(points: &[Point], triangles: &[usize], points_per_bucket: usize) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let side = ((points.len() / points_per_bucket) as f64).sqrt().ceil() as usize;
        let nx = side.max(1);
        let ny = side.max(1);
        let span = |lo: f64, hi: f64, n: usize| {
            let w = (hi - lo) / n as f64;
            if w > 0.0 && w.is_finite() {
                w
            } else {
                1.0
            }
        };

        let mut index = Self {
            min_x,
            min_y,
            max_x,
            max_y,
            cell_w: span(min_x, max_x, nx),
            cell_h: span(min_y, max_y, ny),
            nx,
            ny,
            buckets: vec![Vec::new(); nx * ny],
        };

        for (t, tri) in triangles.chunks_exact(3).enumerate() {
            let (a, b, c) = (&points[tri[0]], &points[tri[1]], &points[tri[2]]);
            let (ix0, iy0) = index.bucket_of(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y));
            let (ix1, iy1) = index.bucket_of(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y));
            for iy in iy0..=iy1 {
                for ix in ix0..=ix1 {
                    index.buckets[iy * nx + ix].push(t);
                }
            }
        }

        index
    }

    fn bucket_of(&self, x: f64, y: f64) -> (usize, usize) {
        let ix = ((x - self.min_x) / self.cell_w).floor().max(0.0) as usize;
        let iy = ((y - self.min_y) / self.cell_h).floor().max(0.0) as usize;
        (ix.min(self.nx - 1), iy.min(self.ny - 1))
    }

    /// Find the triangle containing `(px, py)` and its barycentric weights.
    fn locate(
        &self,
        points: &[Point],
        triangles: &[usize],
        px: f64,
        py: f64,
    ) -> Option<(usize, [f64; 3])> {
        if triangles.is_empty() {
            return None;
        }
        let tol_x = EDGE_EPSILON * (self.max_x - self.min_x).abs().max(1.0);
        let tol_y = EDGE_EPSILON * (self.max_y - self.min_y).abs().max(1.0);
        if px < self.min_x - tol_x
            || px > self.max_x + tol_x
            || py < self.min_y - tol_y
            || py > self.max_y + tol_y
        {
            return None;
        }

        let (ix, iy) = self.bucket_of(px, py);
        self.buckets[iy * self.nx + ix].iter().find_map(|&t| {
            let a = &points[triangles[3 * t]];
            let b = &points[triangles[3 * t + 1]];
            let c = &points[triangles[3 * t + 2]];
            barycentric(a, b, c, px, py).map(|w| (t, w))
        })
    }
}

/// Barycentric weights of `(px, py)` in triangle `abc`, or `None` if the
/// point lies outside it or the triangle is degenerate.
fn barycentric(a: &Point, b: &Point, c: &Point, px: f64, py: f64) -> Option<[f64; 3]> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let l1 = ((b.y - c.y) * (px - c.x) + (c.x - b.x) * (py - c.y)) / det;
    let l2 = ((c.y - a.y) * (px - c.x) + (a.x - c.x) * (py - c.y)) / det;
    let l3 = 1.0 - l1 - l2;
    if l1 >= -EDGE_EPSILON && l2 >= -EDGE_EPSILON && l3 >= -EDGE_EPSILON {
        Some([l1, l2, l3])
    } else {
        None
    }
}
