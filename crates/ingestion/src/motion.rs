//! Ice-motion adapter.
//!
//! The motion product defines the target mesh: its own projected x/y axes
//! become the grid every other source is resampled onto.

use std::path::PathBuf;
use std::sync::Arc;

use grid_processor::gaussian_filter;
use ndarray::{s, Array2};
use seaice_common::{DayAxis, PrepError, PrepResult, TargetGrid};
use tracing::debug;

use crate::config::SourceConfig;
use crate::normalize::motion_to_km_per_day;
use crate::sources::{variables, MotionHandle, MotionStore};

/// One day of smoothed ice motion on the product's own grid.
#[derive(Debug, Clone)]
pub struct MotionFrame {
    pub grid: TargetGrid,
    pub lat: Array2<f64>,
    pub lon: Array2<f64>,
    /// Grid-aligned x velocity (km/day)
    pub u: Array2<f64>,
    /// Grid-aligned y velocity (km/day)
    pub v: Array2<f64>,
}

/// Reads one year of the daily ice-motion product.
pub struct IceMotionAdapter {
    store: Arc<dyn MotionStore>,
    config: SourceConfig,
    year: i32,
}

impl IceMotionAdapter {
    pub fn new(store: Arc<dyn MotionStore>, config: SourceConfig, year: i32) -> Self {
        Self { store, config, year }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Path of the yearly product file.
    pub fn path(&self) -> PathBuf {
        self.config.motion_path(self.year)
    }

    /// The product's time axis (days since 1970-01-01).
    pub fn time_axis(&self) -> PrepResult<DayAxis> {
        let handle = self.store.open(&self.path())?;
        handle.times()
    }

    /// The (subsampled) target grid defined by the product's axes.
    pub fn grid(&self) -> PrepResult<TargetGrid> {
        let handle = self.store.open(&self.path())?;
        self.read_grid(handle.as_ref())
    }

    /// Read, convert and smooth the motion field at `time_index`.
    pub fn load(&self, time_index: usize) -> PrepResult<MotionFrame> {
        let handle = self.store.open(&self.path())?;
        let steps = handle.times()?.len();
        if time_index >= steps {
            return Err(PrepError::configuration(format!(
                "time index {} outside motion axis of length {}",
                time_index, steps
            )));
        }

        let grid = self.read_grid(handle.as_ref())?;
        let stride = self.config.sampling_stride;
        let lat = subsample(&handle.latitude()?, stride);
        let lon = subsample(&handle.longitude()?, stride);
        let component = |name: &str| -> PrepResult<Array2<f64>> {
            let raw = subsample(&handle.field(name, time_index)?, stride);
            grid.check_field(name, &raw)?;
            let converted = motion_to_km_per_day(raw);
            Ok(gaussian_filter(&converted, self.config.smoothing_sigma))
        };
        let u = component(variables::U)?;
        let v = component(variables::V)?;
        drop(handle);

        grid.check_field("latitude", &lat)?;
        grid.check_field("longitude", &lon)?;

        debug!(
            region = %self.config.region,
            time_index,
            rows = grid.rows(),
            cols = grid.cols(),
            "Loaded ice motion"
        );
        Ok(MotionFrame { grid, lat, lon, u, v })
    }

    fn read_grid(&self, handle: &dyn MotionHandle) -> PrepResult<TargetGrid> {
        let stride = self.config.sampling_stride.max(1);
        let xs: Vec<f64> = handle.x()?.into_iter().step_by(stride).collect();
        let ys: Vec<f64> = handle.y()?.into_iter().step_by(stride).collect();
        Ok(TargetGrid::from_axes(&xs, &ys, self.config.region.target_crs()))
    }
}

fn subsample(field: &Array2<f64>, stride: usize) -> Array2<f64> {
    let stride = stride.max(1) as isize;
    field.slice(s![..;stride, ..;stride]).to_owned()
}
