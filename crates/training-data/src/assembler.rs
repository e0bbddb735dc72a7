//! Dataset assembler: pairs day `t` inputs with day `t+1` targets.
//!
//! ```text
//! ┌───────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Ice motion    │   │ Reanalysis   │   │ Concentration │
//! │ (t, t+1)      │   │ (t, [t+1])   │   │ (optional)    │
//! └───────┬───────┘   └──────┬───────┘   └───────┬───────┘
//!         └──────────────────┼───────────────────┘
//!                            ▼
//!                   normalized Frame per index
//!                            ▼
//!                 layout (entire / cell / table)
//!                            ▼
//!                         Dataset
//! ```

use std::sync::Arc;

use ingestion::normalize::{normalize_temperature, normalize_velocity};
use ingestion::{ConcentrationAdapter, IceMotionAdapter, ReanalysisAdapter, ReanalysisSource};
use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;
use seaice_common::{DayAxis, PrepError, PrepResult, Region, TargetGrid};
use tracing::{debug, info, warn};

use crate::config::{AssemblyConfig, ConcentrationOrigin};
use crate::dataset::{Dataset, SkippedIndex};
use crate::layout::{lay_out, Frame};

/// Skip label for indices whose following day is outside the time axis.
const OUT_OF_RANGE: &str = "out_of_range";

/// Builds datasets from the source adapters of one region and year.
pub struct DatasetAssembler {
    motion: IceMotionAdapter,
    reanalysis_source: Arc<dyn ReanalysisSource>,
    reanalysis: ReanalysisAdapter,
    concentration: Option<ConcentrationAdapter>,
    config: AssemblyConfig,
}

impl DatasetAssembler {
    pub fn new(
        motion: IceMotionAdapter,
        reanalysis_source: Arc<dyn ReanalysisSource>,
        reanalysis: ReanalysisAdapter,
        config: AssemblyConfig,
    ) -> Self {
        Self {
            motion,
            reanalysis_source,
            reanalysis,
            concentration: None,
            config,
        }
    }

    /// Use a satellite product for the concentration channels.
    pub fn with_concentration(mut self, adapter: ConcentrationAdapter) -> Self {
        self.concentration = Some(adapter);
        self
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    fn region(&self) -> Region {
        self.motion.config().region
    }

    /// Assemble samples for `indices`, in the given order.
    ///
    /// Indices whose sources are missing are recorded in
    /// [`Dataset::skipped`] unless the configuration is strict.
    pub fn assemble(&self, indices: &[usize]) -> PrepResult<Dataset> {
        self.check_setup()?;
        let axis = self.check_time_axes()?;
        let grid = self.motion.grid()?;
        let steps = axis.len();

        info!(
            region = %self.region(),
            layout = %self.config.layout,
            requested = indices.len(),
            rows = grid.rows(),
            cols = grid.cols(),
            parallel = self.config.parallel,
            "Assembling dataset"
        );

        let attempt = |index: usize| -> Option<PrepResult<Frame>> {
            if index + 1 >= steps {
                None
            } else {
                Some(self.build_frame(index, &axis, &grid))
            }
        };
        let outcomes: Vec<Option<PrepResult<Frame>>> = if self.config.parallel {
            indices.par_iter().map(|&i| attempt(i)).collect()
        } else {
            indices.iter().map(|&i| attempt(i)).collect()
        };

        let mut frames = Vec::with_capacity(indices.len());
        let mut skipped = Vec::new();
        for (&index, outcome) in indices.iter().zip(outcomes) {
            match outcome {
                Some(Ok(frame)) => frames.push(frame),
                None => {
                    let reason = format!(
                        "time index {} has no following day in an axis of {} steps",
                        index, steps
                    );
                    if self.config.strict {
                        return Err(PrepError::configuration(reason));
                    }
                    skipped.push(skip(index, OUT_OF_RANGE, reason));
                }
                Some(Err(e)) if e.is_per_index() && !self.config.strict => {
                    skipped.push(skip(index, e.kind(), e.to_string()));
                }
                Some(Err(e)) => return Err(e),
            }
        }

        let laid_out = lay_out(&frames, self.config.layout, self.config.window, &grid)?;
        let dataset = Dataset {
            layout: self.config.layout,
            grid_shape: grid.shape(),
            samples: laid_out.samples,
            xx: laid_out.xx,
            yy: laid_out.yy,
            time_indices: laid_out.time_indices,
            skipped,
        };

        info!(
            frames = frames.len(),
            samples = dataset.len(),
            skipped = dataset.skipped.len(),
            "Assembled dataset"
        );
        Ok(dataset)
    }

    fn check_setup(&self) -> PrepResult<()> {
        if let ConcentrationOrigin::Satellite(product) = self.config.concentration {
            match &self.concentration {
                Some(adapter) if adapter.product() == product => {}
                Some(adapter) => {
                    return Err(PrepError::configuration(format!(
                        "configured for {} concentration but the adapter reads {}",
                        product,
                        adapter.product()
                    )))
                }
                None => {
                    return Err(PrepError::configuration(format!(
                        "configured for {} concentration but no adapter was given",
                        product
                    )))
                }
            }
        }
        Ok(())
    }

    /// The motion axis must be daily and the reanalysis axis identical to it.
    fn check_time_axes(&self) -> PrepResult<DayAxis> {
        let axis = self.motion.time_axis()?;
        axis.validate_daily()?;
        let reanalysis_axis = self.reanalysis_source.times()?;
        axis.ensure_aligned(&reanalysis_axis, "reanalysis")?;
        Ok(axis)
    }

    fn build_frame(&self, index: usize, axis: &DayAxis, grid: &TargetGrid) -> PrepResult<Frame> {
        let region = self.region();
        let day = axis.date(index)?;
        let next_day = axis.date(index + 1)?;

        let today = self.motion.load(index)?;
        let tomorrow = self.motion.load(index + 1)?;
        for field in [&today.u, &today.v, &tomorrow.u, &tomorrow.v] {
            grid.check_field("ice motion", field)?;
        }

        let source = self.reanalysis_source.as_ref();
        let weather = self.reanalysis.load(source, index, grid, region)?;
        let (sic_today, sic_tomorrow) = match self.config.concentration {
            ConcentrationOrigin::Reanalysis => {
                let next = self.reanalysis.load(source, index + 1, grid, region)?;
                (weather.sic.clone(), next.sic)
            }
            ConcentrationOrigin::Satellite(product) => {
                let adapter = self.concentration.as_ref().ok_or_else(|| {
                    PrepError::configuration(format!("no {} concentration adapter", product))
                })?;
                (
                    adapter.load(day, grid, region)?,
                    adapter.load(next_day, grid, region)?,
                )
            }
        };

        let input = stack_channels(&[
            normalize_velocity(&today.u),
            normalize_velocity(&today.v),
            sic_today,
            normalize_temperature(&weather.t2m),
            normalize_velocity(&weather.u10),
            normalize_velocity(&weather.v10),
        ])?;
        let output = stack_channels(&[
            normalize_velocity(&tomorrow.u),
            normalize_velocity(&tomorrow.v),
            sic_tomorrow,
        ])?;

        debug!(index, %day, %next_day, "Built frame");
        Frame::new(index, input, output)
    }
}

fn skip(index: usize, kind: &str, reason: String) -> SkippedIndex {
    warn!(index, kind, reason = %reason, "Skipping time index");
    SkippedIndex {
        index,
        kind: kind.to_string(),
        reason,
    }
}

/// Stack 2-D fields into a channel-last tensor.
fn stack_channels(fields: &[Array2<f64>]) -> PrepResult<Array3<f64>> {
    let views: Vec<_> = fields.iter().map(|f| f.view()).collect();
    ndarray::stack(Axis(2), &views)
        .map_err(|e| PrepError::shape_mismatch(format!("cannot stack channels: {}", e)))
}
