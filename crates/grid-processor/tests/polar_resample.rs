//! Integration test: resample a geographic field onto an EASE-Grid mesh.
//!
//! A smooth field defined on a regular lat/lon lattice is projected into
//! EPSG:3408 and interpolated onto a small target grid. The result must
//! match the analytic field at the target cells and be NaN outside the
//! lattice footprint.

use grid_processor::{ResamplerCache, ScatteredResampler};
use projection::{CrsTransform, EaseGrid};
use seaice_common::{CrsCode, TargetGrid};

fn lattice() -> (Vec<f64>, Vec<f64>) {
    let mut lats = Vec::new();
    let mut lons = Vec::new();
    for i in 0..=40 {
        for j in 0..=80 {
            lats.push(74.0 + 0.05 * i as f64);
            lons.push(-2.0 + 0.05 * j as f64);
        }
    }
    (lats, lons)
}

fn target_grid(half_width: f64) -> TargetGrid {
    let (_, y0) = EaseGrid::north().forward(75.0, 0.0);
    let xs = [-half_width, 0.0, half_width];
    let ys: Vec<f64> = xs.iter().map(|d| y0 + d).collect();
    TargetGrid::from_axes(&xs, &ys, CrsCode::Epsg3408)
}

#[test]
fn test_geographic_field_onto_ease_grid() {
    let (lats, lons) = lattice();
    let transform = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3408).unwrap();
    let (xs, ys): (Vec<f64>, Vec<f64>) = lats
        .iter()
        .zip(&lons)
        .map(|(&lat, &lon)| transform.transform(lat, lon))
        .unzip();

    // Linear in projected coordinates, so linear interpolation is exact
    let values: Vec<f64> = xs.iter().zip(&ys).map(|(x, y)| 1e-4 * x - 2e-5 * y).collect();

    let grid = target_grid(25_000.0);
    let resampler = ScatteredResampler::new(&xs, &ys, &grid).unwrap();
    assert_eq!(resampler.defined_cells(), 9);

    let out = resampler.apply(&values).unwrap();
    for r in 0..3 {
        for c in 0..3 {
            let (x, y) = grid.coord(r, c).unwrap();
            let expected = 1e-4 * x - 2e-5 * y;
            assert!(
                (out[[r, c]] - expected).abs() < 1e-6 * expected.abs().max(1.0),
                "cell ({}, {}): {} vs {}",
                r,
                c,
                out[[r, c]],
                expected
            );
        }
    }
}

#[test]
fn test_cells_beyond_footprint_are_nan() {
    let (lats, lons) = lattice();
    let transform = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3408).unwrap();
    let (xs, ys): (Vec<f64>, Vec<f64>) = lats
        .iter()
        .zip(&lons)
        .map(|(&lat, &lon)| transform.transform(lat, lon))
        .unzip();
    let values = vec![1.0; xs.len()];

    // 400 km in each direction falls well outside a 2°x4° patch at 75°N
    let grid = target_grid(400_000.0);
    let cache = ResamplerCache::new(2);
    let out = cache.get_or_build(&xs, &ys, &grid).unwrap().apply(&values).unwrap();

    assert!((out[[1, 1]] - 1.0).abs() < 1e-12);
    assert!(out[[0, 0]].is_nan());
    assert!(out[[2, 2]].is_nan());
    assert!(out[[1, 0]].is_nan());

    // Second lookup is served from the cache
    cache.get_or_build(&xs, &ys, &grid).unwrap();
    assert_eq!(cache.stats().hits, 1);
}
