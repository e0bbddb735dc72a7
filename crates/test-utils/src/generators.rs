//! Generators for synthetic sea-ice sources.
//!
//! Every generator is deterministic so tests can assert exact values.

use std::sync::Arc;

use ingestion::{InMemoryConcentration, InMemoryMotion, InMemoryReanalysis, NativeConcentration};
use ndarray::Array2;
use projection::EaseGrid;
use seaice_common::{CrsCode, Region, TargetGrid};

use crate::fixtures::{mesh, patch, values};

/// `count` consecutive daily offsets starting at `first_day`.
pub fn daily_axis(first_day: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| first_day + i as f64).collect()
}

/// `start + step * i` for `i in 0..count`.
pub fn regular_axis(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Axes of a square EASE-Grid North mesh of `size` cells per side.
///
/// Cells are spaced by `spacing` metres and centred on
/// `(center_lat, 0°E)`. Rows run from the lowest latitude towards the pole.
///
/// # Example
///
/// ```
/// let (xs, ys) = test_utils::ease_north_axes(4, 75.0, 25_000.0);
/// assert_eq!(xs, vec![-37_500.0, -12_500.0, 12_500.0, 37_500.0]);
/// assert!(ys[0] < ys[3]);
/// ```
pub fn ease_north_axes(size: usize, center_lat: f64, spacing: f64) -> (Vec<f64>, Vec<f64>) {
    let (_, y0) = EaseGrid::north().forward(center_lat, 0.0);
    let half = (size as f64 - 1.0) / 2.0;
    let offsets: Vec<f64> = (0..size).map(|i| (i as f64 - half) * spacing).collect();
    let ys = offsets.iter().map(|d| y0 + d).collect();
    (offsets, ys)
}

/// The scenario mesh as a [`TargetGrid`].
pub fn scenario_grid(size: usize) -> TargetGrid {
    let (xs, ys) = ease_north_axes(size, mesh::CENTER_LAT, mesh::CELL_SIZE);
    TargetGrid::from_axes(&xs, &ys, CrsCode::Epsg3408)
}

/// Latitude and longitude of every cell of an EASE-Grid North mesh.
pub fn ease_north_geographic(xs: &[f64], ys: &[f64]) -> (Array2<f64>, Array2<f64>) {
    let ease = EaseGrid::north();
    let shape = (ys.len(), xs.len());
    let geo = |r: usize, c: usize| ease.inverse(xs[c], ys[r]).unwrap_or((f64::NAN, f64::NAN));
    let lat = Array2::from_shape_fn(shape, |(r, c)| geo(r, c).0);
    let lon = Array2::from_shape_fn(shape, |(r, c)| geo(r, c).1);
    (lat, lon)
}

/// Ice-motion product with the same drift `(u, v)` (cm/s) on every cell
/// and every day.
pub fn uniform_motion(xs: &[f64], ys: &[f64], days: &[f64], u: f64, v: f64) -> InMemoryMotion {
    let (lat, lon) = ease_north_geographic(xs, ys);
    let shape = (ys.len(), xs.len());
    let frames = |value: f64| vec![Array2::from_elem(shape, value); days.len()];
    match InMemoryMotion::new(
        days.to_vec(),
        xs.to_vec(),
        ys.to_vec(),
        lat,
        lon,
        frames(u),
        frames(v),
    ) {
        Ok(motion) => motion,
        Err(e) => panic!("inconsistent synthetic motion: {e}"),
    }
}

/// Ice cover of the scenario at a geographic position.
pub fn scenario_ice_cover(lat: f64, lon: f64) -> f64 {
    if lat < patch::ICE_FREE_LAT_BELOW && lon < patch::ICE_FREE_LON_BELOW {
        0.0
    } else {
        1.0
    }
}

/// Reanalysis patch over the scenario mesh.
///
/// Temperature and wind are uniform; ice cover is given by `sic(lat, lon)`
/// and is the same on every day.
pub fn reanalysis_patch<F>(days: &[f64], t2m: f64, u10: f64, v10: f64, sic: F) -> InMemoryReanalysis
where
    F: Fn(f64, f64) -> f64,
{
    let lat = regular_axis(patch::LAT_START, patch::STEP, patch::LAT_COUNT);
    let lon = regular_axis(patch::LON_START, patch::STEP, patch::LON_COUNT);
    let shape = (lat.len(), lon.len());
    let cover = Array2::from_shape_fn(shape, |(i, j)| sic(lat[i], lon[j]));
    let frames = |field: Array2<f64>| vec![field; days.len()];

    InMemoryReanalysis::new(lat, lon, days.to_vec())
        .with_field("t2m", frames(Array2::from_elem(shape, t2m)))
        .with_field("u10", frames(Array2::from_elem(shape, u10)))
        .with_field("v10", frames(Array2::from_elem(shape, v10)))
        .with_field("siconc", frames(cover))
}

/// Swath concentration frame (percent) on a 0.1° lattice over the scenario.
pub fn swath_frame(percent: f64) -> NativeConcentration {
    let shape = (21, 61);
    NativeConcentration::Geographic {
        lat: Array2::from_shape_fn(shape, |(r, _)| patch::LAT_START + 0.1 * r as f64),
        lon: Array2::from_shape_fn(shape, |(_, c)| patch::LON_START + 0.1 * c as f64),
        values: Array2::from_elem(shape, percent),
    }
}

/// Swath concentration for every day of `days` except the ones in `missing`.
pub fn swath_concentration(days: &[f64], missing: &[usize], percent: f64) -> InMemoryConcentration {
    let mut source = InMemoryConcentration::new();
    for (i, day) in days.iter().enumerate() {
        if missing.contains(&i) {
            continue;
        }
        match seaice_common::offset_to_date(*day) {
            Ok(date) => source.insert(Region::North, date, swath_frame(percent)),
            Err(e) => panic!("bad synthetic day {day}: {e}"),
        }
    }
    source
}

/// Everything the assembler needs for the synthetic Arctic scenario.
pub struct ArcticScenario {
    pub grid: TargetGrid,
    pub days: Vec<f64>,
    pub motion: Arc<InMemoryMotion>,
    pub reanalysis: Arc<InMemoryReanalysis>,
}

/// The standard scenario: a `size`×`size` mesh, `days` daily steps,
/// uniform drift of `u = 10`, `v = -10` cm/s, 260 K, calm wind and an
/// ice-free south-west quarter.
pub fn arctic_scenario(size: usize, days: usize) -> ArcticScenario {
    let (xs, ys) = ease_north_axes(size, mesh::CENTER_LAT, mesh::CELL_SIZE);
    let axis = daily_axis(values::FIRST_DAY, days);
    let motion = uniform_motion(
        &xs,
        &ys,
        &axis,
        values::DRIFT_CM_PER_S,
        -values::DRIFT_CM_PER_S,
    );
    let reanalysis = reanalysis_patch(
        &axis,
        values::AIR_TEMPERATURE_K,
        values::WIND_M_PER_S,
        values::WIND_M_PER_S,
        scenario_ice_cover,
    );

    ArcticScenario {
        grid: TargetGrid::from_axes(&xs, &ys, CrsCode::Epsg3408),
        days: axis,
        motion: Arc::new(motion),
        reanalysis: Arc::new(reanalysis),
    }
}
