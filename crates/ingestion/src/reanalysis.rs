//! Reanalysis adapter: 2 m temperature, 10 m wind and sea-ice cover on the
//! target grid.

use std::sync::Arc;

use grid_processor::ResamplerCache;
use ndarray::Array2;
use projection::{rotate_field, ProjectionRegistry};
use seaice_common::{PrepError, PrepResult, Region, SourceKind, TargetGrid};
use tracing::debug;

use crate::normalize::fill_invalid;
use crate::sources::{variables, ReanalysisSource};

/// Reanalysis fields for one time step, resampled and zero-filled.
#[derive(Debug, Clone)]
pub struct ReanalysisFields {
    /// 2 m temperature (K)
    pub t2m: Array2<f64>,
    /// 10 m wind, grid-aligned x component (m/s)
    pub u10: Array2<f64>,
    /// 10 m wind, grid-aligned y component (m/s)
    pub v10: Array2<f64>,
    /// Sea-ice cover fraction
    pub sic: Array2<f64>,
}

pub struct ReanalysisAdapter {
    registry: ProjectionRegistry,
    cache: Arc<ResamplerCache>,
}

impl ReanalysisAdapter {
    pub fn new(registry: ProjectionRegistry, cache: Arc<ResamplerCache>) -> Self {
        Self { registry, cache }
    }

    /// Read, rotate, reproject and resample one reanalysis time step.
    pub fn load(
        &self,
        source: &dyn ReanalysisSource,
        time_index: usize,
        grid: &TargetGrid,
        region: Region,
    ) -> PrepResult<ReanalysisFields> {
        let lat = source.latitude()?;
        let lon = source.longitude()?;
        let steps = source.times()?.len();
        if time_index >= steps {
            return Err(PrepError::configuration(format!(
                "time index {} outside reanalysis axis of length {}",
                time_index, steps
            )));
        }

        // Longitude-major meshgrid: element [i, j] is (lat[j], lon[i])
        let shape = (lon.len(), lat.len());
        let lat2 = Array2::from_shape_fn(shape, |(_, j)| lat[j]);
        let lon2 = Array2::from_shape_fn(shape, |(i, _)| lon[i]);

        // Raw fields are latitude-major; transpose to match the meshgrid
        let read = |name: &str| -> PrepResult<Array2<f64>> {
            let field = source.field(name, time_index)?;
            if field.dim() != (lat.len(), lon.len()) {
                return Err(PrepError::shape_mismatch(format!(
                    "reanalysis field '{}' has shape {:?}, axes give ({}, {})",
                    name,
                    field.dim(),
                    lat.len(),
                    lon.len()
                )));
            }
            Ok(field.reversed_axes())
        };
        let t2m = read(variables::T2M)?;
        let sic = read(variables::SICONC)?;
        let (u10, v10) = rotate_field(&read(variables::U10)?, &read(variables::V10)?, &lon2)?;

        let transform = self.registry.transform(region, SourceKind::Reanalysis)?;
        if transform.target() != grid.crs() {
            return Err(PrepError::configuration(format!(
                "reanalysis for {} projects to {}, grid is {}",
                region,
                transform.target(),
                grid.crs()
            )));
        }
        let (x, y) = transform.transform_arrays(&lat2, &lon2)?;
        let xs: Vec<f64> = x.iter().copied().collect();
        let ys: Vec<f64> = y.iter().copied().collect();
        let resampler = self.cache.get_or_build(&xs, &ys, grid)?;

        let resample = |field: &Array2<f64>| -> PrepResult<Array2<f64>> {
            let mut out = resampler.apply_field(field)?;
            fill_invalid(&mut out);
            Ok(out)
        };
        let fields = ReanalysisFields {
            t2m: resample(&t2m)?,
            u10: resample(&u10)?,
            v10: resample(&v10)?,
            sic: resample(&sic)?,
        };

        debug!(
            region = %region,
            time_index,
            points = xs.len(),
            defined_cells = resampler.defined_cells(),
            "Loaded reanalysis step"
        );
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::InMemoryReanalysis;
    use approx::assert_abs_diff_eq;
    use projection::EaseGrid;
    use seaice_common::CrsCode;

    fn axes() -> (Vec<f64>, Vec<f64>) {
        let lat: Vec<f64> = (0..=20).map(|i| 74.0 + 0.1 * i as f64).collect();
        let lon: Vec<f64> = (0..=40).map(|i| -4.0 + 0.2 * i as f64).collect();
        (lat, lon)
    }

    fn grid() -> TargetGrid {
        let (_, y0) = EaseGrid::north().forward(75.0, 0.0);
        let xs = [-20_000.0, 0.0, 20_000.0];
        let ys: Vec<f64> = xs.iter().map(|d| y0 + d).collect();
        TargetGrid::from_axes(&xs, &ys, CrsCode::Epsg3408)
    }

    fn source(lat: &[f64], lon: &[f64], u10: f64, v10: f64) -> InMemoryReanalysis {
        let shape = (lat.len(), lon.len());
        InMemoryReanalysis::new(lat.to_vec(), lon.to_vec(), vec![0.0])
            .with_field("t2m", vec![Array2::from_elem(shape, 260.0)])
            .with_field("u10", vec![Array2::from_elem(shape, u10)])
            .with_field("v10", vec![Array2::from_elem(shape, v10)])
            .with_field("siconc", vec![Array2::from_elem(shape, 0.9)])
    }

    #[test]
    fn test_uniform_fields() {
        let (lat, lon) = axes();
        let adapter = ReanalysisAdapter::new(ProjectionRegistry::standard(), Arc::new(ResamplerCache::new(2)));
        let fields = adapter
            .load(&source(&lat, &lon, 0.0, 0.0), 0, &grid(), Region::North)
            .unwrap();
        for (t, s) in fields.t2m.iter().zip(fields.sic.iter()) {
            assert_abs_diff_eq!(*t, 260.0, epsilon = 1e-9);
            assert_abs_diff_eq!(*s, 0.9, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_wind_rotated_by_longitude() {
        // Near lon 0 the rotation is small; on the centre column the
        // interpolated angle is ~0, so an eastward wind stays eastward.
        let (lat, lon) = axes();
        let adapter = ReanalysisAdapter::new(ProjectionRegistry::standard(), Arc::new(ResamplerCache::new(2)));
        let fields = adapter
            .load(&source(&lat, &lon, 5.0, 0.0), 0, &grid(), Region::North)
            .unwrap();
        assert_abs_diff_eq!(fields.u10[[1, 1]], 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fields.v10[[1, 1]], 0.0, epsilon = 1e-6);
        // East of Greenwich the rotated v component turns positive
        assert!(fields.v10[[1, 2]] > 0.0);
        assert!(fields.v10[[1, 0]] < 0.0);
    }

    #[test]
    fn test_shape_mismatch_and_bad_index() {
        let (lat, lon) = axes();
        let adapter = ReanalysisAdapter::new(ProjectionRegistry::standard(), Arc::new(ResamplerCache::new(2)));
        let bad = InMemoryReanalysis::new(lat.clone(), lon.clone(), vec![0.0])
            .with_field("t2m", vec![Array2::zeros((lon.len(), lat.len()))]);
        assert!(matches!(
            adapter.load(&bad, 0, &grid(), Region::North),
            Err(PrepError::ShapeMismatch(_))
        ));

        let ok = source(&lat, &lon, 0.0, 0.0);
        assert!(matches!(
            adapter.load(&ok, 1, &grid(), Region::North),
            Err(PrepError::Configuration(_))
        ));
    }
}
