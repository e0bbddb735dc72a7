//! Sea-ice concentration adapter.
//!
//! Two products are supported: the passive-microwave swath product
//! (percent, geographic coordinates) and the daily analysis product
//! (fraction, polar stereographic axes). Both end up as a fraction in
//! `[0, 1]` on the target grid with undefined cells set to 0.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use grid_processor::ResamplerCache;
use ndarray::Array2;
use projection::ProjectionRegistry;
use seaice_common::{PrepError, PrepResult, Region, SourceKind, TargetGrid};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SourceConfig;
use crate::normalize::{clamp_concentration, fill_invalid, DAILY_FRACTION_MAX, SWATH_PERCENT_MAX};
use crate::sources::{ConcentrationSource, NativeConcentration};

/// Which satellite concentration product to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationProduct {
    /// AMSR2 25 km swath, percent on geographic coordinates
    Swath,
    /// NOAA/NSIDC climate data record, fraction on polar stereographic axes
    DailyAnalysis,
}

impl ConcentrationProduct {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            ConcentrationProduct::Swath => SourceKind::SwathConcentration,
            ConcentrationProduct::DailyAnalysis => SourceKind::DailyConcentration,
        }
    }

    /// Largest valid raw value; anything above (or `<= 0`) becomes 0.
    pub fn upper_bound(&self) -> f64 {
        match self {
            ConcentrationProduct::Swath => SWATH_PERCENT_MAX,
            ConcentrationProduct::DailyAnalysis => DAILY_FRACTION_MAX,
        }
    }

    /// Factor converting raw values to a fraction.
    pub fn scale(&self) -> f64 {
        match self {
            ConcentrationProduct::Swath => 0.01,
            ConcentrationProduct::DailyAnalysis => 1.0,
        }
    }

    /// File holding the product for `date`.
    pub fn path(&self, config: &SourceConfig, date: NaiveDate) -> PathBuf {
        match self {
            ConcentrationProduct::Swath => config.swath_concentration_path(date),
            ConcentrationProduct::DailyAnalysis => config.daily_concentration_path(date),
        }
    }
}

impl FromStr for ConcentrationProduct {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "swath" | "amsr" => Ok(ConcentrationProduct::Swath),
            "daily_analysis" | "daily" | "noaa" => Ok(ConcentrationProduct::DailyAnalysis),
            _ => Err(PrepError::configuration(format!(
                "unknown concentration product: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ConcentrationProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcentrationProduct::Swath => f.write_str("swath"),
            ConcentrationProduct::DailyAnalysis => f.write_str("daily_analysis"),
        }
    }
}

/// Reads one concentration product and resamples it onto a target grid.
pub struct ConcentrationAdapter {
    product: ConcentrationProduct,
    source: Arc<dyn ConcentrationSource>,
    registry: ProjectionRegistry,
    cache: Arc<ResamplerCache>,
}

impl ConcentrationAdapter {
    pub fn new(
        product: ConcentrationProduct,
        source: Arc<dyn ConcentrationSource>,
        registry: ProjectionRegistry,
        cache: Arc<ResamplerCache>,
    ) -> Self {
        Self {
            product,
            source,
            registry,
            cache,
        }
    }

    pub fn product(&self) -> ConcentrationProduct {
        self.product
    }

    /// Concentration fraction for `date` on `grid`.
    ///
    /// A missing product yields [`PrepError::MissingSourceFile`].
    pub fn load(&self, date: NaiveDate, grid: &TargetGrid, region: Region) -> PrepResult<Array2<f64>> {
        let transform = self.registry.transform(region, self.product.source_kind())?;
        if transform.target() != grid.crs() {
            return Err(PrepError::configuration(format!(
                "{} concentration for {} projects to {}, grid is {}",
                self.product,
                region,
                transform.target(),
                grid.crs()
            )));
        }

        if !self.source.exists(date, region) {
            return Err(PrepError::MissingSourceFile {
                path: self.source.locate(date, region),
                date,
            });
        }
        let native = self.source.load(date, region)?;
        native.validate()?;

        let (xs, ys, mut values) = match native {
            NativeConcentration::Geographic { lat, lon, values } => {
                if !transform.source().is_geographic() {
                    return Err(PrepError::configuration(format!(
                        "{} product delivered geographic coordinates, expected {}",
                        self.product,
                        transform.source()
                    )));
                }
                let (x, y) = transform.transform_arrays(&lat, &lon)?;
                (x.iter().copied().collect::<Vec<_>>(), y.iter().copied().collect(), values)
            }
            NativeConcentration::Projected { x, y, values } => {
                if transform.source().is_geographic() {
                    return Err(PrepError::configuration(format!(
                        "{} product delivered projected axes, expected {}",
                        self.product,
                        transform.source()
                    )));
                }
                let mut xs = Vec::with_capacity(values.len());
                let mut ys = Vec::with_capacity(values.len());
                for &row in &y {
                    for &col in &x {
                        let (tx, ty) = transform.transform(col, row);
                        xs.push(tx);
                        ys.push(ty);
                    }
                }
                (xs, ys, values)
            }
        };

        clamp_concentration(&mut values, self.product.upper_bound());
        let resampler = self.cache.get_or_build(&xs, &ys, grid)?;
        let mut out = resampler.apply_field(&values)?;
        fill_invalid(&mut out);
        let scale = self.product.scale();
        out.mapv_inplace(|v| v * scale);

        debug!(
            product = %self.product,
            region = %region,
            date = %date,
            defined_cells = resampler.defined_cells(),
            "Loaded sea-ice concentration"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ConcentrationReader, DirectoryConcentrationSource, InMemoryConcentration};
    use approx::assert_abs_diff_eq;
    use projection::{EaseGrid, PolarStereographic};
    use seaice_common::CrsCode;
    use std::path::Path;

    fn target_grid() -> TargetGrid {
        let (_, y0) = EaseGrid::north().forward(80.0, 0.0);
        let xs = [-25_000.0, 0.0, 25_000.0];
        let ys: Vec<f64> = xs.iter().map(|d| y0 + d).collect();
        TargetGrid::from_axes(&xs, &ys, CrsCode::Epsg3408)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, 1).unwrap()
    }

    fn adapter(product: ConcentrationProduct, source: Arc<dyn ConcentrationSource>) -> ConcentrationAdapter {
        ConcentrationAdapter::new(
            product,
            source,
            ProjectionRegistry::standard(),
            Arc::new(ResamplerCache::new(4)),
        )
    }

    fn swath_frame(percent: f64) -> NativeConcentration {
        let lat = Array2::from_shape_fn((21, 41), |(r, _)| 79.0 + 0.1 * r as f64);
        let lon = Array2::from_shape_fn((21, 41), |(_, c)| -4.0 + 0.2 * c as f64);
        NativeConcentration::Geographic {
            lat,
            lon,
            values: Array2::from_elem((21, 41), percent),
        }
    }

    #[test]
    fn test_swath_percent_to_fraction() {
        let mut source = InMemoryConcentration::new();
        source.insert(Region::North, date(), swath_frame(80.0));
        let out = adapter(ConcentrationProduct::Swath, Arc::new(source))
            .load(date(), &target_grid(), Region::North)
            .unwrap();
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 0.8, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_swath_invalid_values_become_zero() {
        let mut source = InMemoryConcentration::new();
        source.insert(Region::North, date(), swath_frame(120.0));
        let out = adapter(ConcentrationProduct::Swath, Arc::new(source))
            .load(date(), &target_grid(), Region::North)
            .unwrap();
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_daily_analysis_from_stereographic_axes() {
        // Stereographic axes covering the target footprint around 80°N
        let stereo = PolarStereographic::nsidc_north();
        let (cx, cy) = stereo.forward(80.0, 0.0);
        let xs: Vec<f64> = (-10..=10).map(|i| cx + 12_500.0 * i as f64).collect();
        let ys: Vec<f64> = (-10..=10).map(|i| cy + 12_500.0 * i as f64).collect();

        let mut source = InMemoryConcentration::new();
        source.insert(
            Region::North,
            date(),
            NativeConcentration::Projected {
                values: Array2::from_elem((ys.len(), xs.len()), 0.65),
                x: xs,
                y: ys,
            },
        );
        let out = adapter(ConcentrationProduct::DailyAnalysis, Arc::new(source))
            .load(date(), &target_grid(), Region::North)
            .unwrap();
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 0.65, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cells_outside_coverage_are_zero() {
        let mut source = InMemoryConcentration::new();
        source.insert(Region::North, date(), swath_frame(50.0));
        let (_, y0) = EaseGrid::north().forward(80.0, 0.0);
        let grid = TargetGrid::from_axes(&[0.0, 900_000.0], &[y0], CrsCode::Epsg3408);

        let out = adapter(ConcentrationProduct::Swath, Arc::new(source))
            .load(date(), &grid, Region::North)
            .unwrap();
        assert_abs_diff_eq!(out[[0, 0]], 0.5, epsilon = 1e-9);
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn test_wrong_coordinate_kind_is_rejected() {
        let mut source = InMemoryConcentration::new();
        source.insert(Region::North, date(), swath_frame(50.0));
        let err = adapter(ConcentrationProduct::DailyAnalysis, Arc::new(source))
            .load(date(), &target_grid(), Region::North)
            .unwrap_err();
        assert!(matches!(err, PrepError::Configuration(_)));
    }

    struct PanickingReader;

    impl ConcentrationReader for PanickingReader {
        fn read(&self, path: &Path) -> PrepResult<NativeConcentration> {
            panic!("reader must not be called for missing file {}", path.display());
        }
    }

    #[test]
    fn test_missing_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryConcentrationSource::new(
            dir.path(),
            ConcentrationProduct::DailyAnalysis,
            Box::new(PanickingReader),
        );
        let expected = source.locate(date(), Region::North);
        assert!(expected.ends_with("NH/SIC_NOAA/seaice_conc_daily_NH_20200201_f17_v04r00.nc"));

        let err = adapter(ConcentrationProduct::DailyAnalysis, Arc::new(source))
            .load(date(), &target_grid(), Region::North)
            .unwrap_err();
        match err {
            PrepError::MissingSourceFile { path, date: d } => {
                assert_eq!(path, expected);
                assert_eq!(d, date());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_product_parsing() {
        assert_eq!("AMSR".parse::<ConcentrationProduct>().unwrap(), ConcentrationProduct::Swath);
        assert_eq!(
            "noaa".parse::<ConcentrationProduct>().unwrap(),
            ConcentrationProduct::DailyAnalysis
        );
        assert!("ssmi".parse::<ConcentrationProduct>().is_err());
    }
}
