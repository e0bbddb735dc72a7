//! Collaborator interfaces for the raw products, plus in-memory
//! implementations.
//!
//! Parsing container formats is outside this crate: a product is anything
//! that can hand out named 2-D variables for a time step. The adapters in
//! this crate only depend on these traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use ndarray::Array2;
use seaice_common::{DayAxis, PrepError, PrepResult, Region};

use crate::concentration::ConcentrationProduct;
use crate::config::SourceConfig;

/// Variable names understood by the sources.
pub mod variables {
    pub const U: &str = "u";
    pub const V: &str = "v";
    pub const T2M: &str = "t2m";
    pub const U10: &str = "u10";
    pub const V10: &str = "v10";
    pub const SICONC: &str = "siconc";
}

// ============================================================================
// Ice motion
// ============================================================================

/// An open ice-motion product. Dropping the handle closes it.
pub trait MotionHandle {
    /// Time axis in days since 1970-01-01.
    fn times(&self) -> PrepResult<DayAxis>;
    /// Projected x axis (columns).
    fn x(&self) -> PrepResult<Vec<f64>>;
    /// Projected y axis (rows).
    fn y(&self) -> PrepResult<Vec<f64>>;
    fn latitude(&self) -> PrepResult<Array2<f64>>;
    fn longitude(&self) -> PrepResult<Array2<f64>>;
    /// Raw `u` or `v` component in cm/s for one time step.
    fn field(&self, name: &str, time_index: usize) -> PrepResult<Array2<f64>>;
}

/// Opens ice-motion products by path.
pub trait MotionStore: Send + Sync {
    fn open<'a>(&'a self, path: &Path) -> PrepResult<Box<dyn MotionHandle + 'a>>;
}

/// Ice-motion product held in memory.
///
/// Tracks how many handles are open so callers can check that every read
/// was scoped.
#[derive(Debug, Clone)]
pub struct InMemoryMotion {
    days: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    latitude: Array2<f64>,
    longitude: Array2<f64>,
    u: Vec<Array2<f64>>,
    v: Vec<Array2<f64>>,
    open_handles: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
}

impl InMemoryMotion {
    /// Build a product; every 2-D array must have shape `(y.len(), x.len())`
    /// and there must be one `u`/`v` frame per day.
    pub fn new(
        days: Vec<f64>,
        x: Vec<f64>,
        y: Vec<f64>,
        latitude: Array2<f64>,
        longitude: Array2<f64>,
        u: Vec<Array2<f64>>,
        v: Vec<Array2<f64>>,
    ) -> PrepResult<Self> {
        let shape = (y.len(), x.len());
        if u.len() != days.len() || v.len() != days.len() {
            return Err(PrepError::shape_mismatch(format!(
                "{} days but {} u and {} v frames",
                days.len(),
                u.len(),
                v.len()
            )));
        }
        let all = [&latitude, &longitude].into_iter().chain(u.iter()).chain(v.iter());
        for field in all {
            if field.dim() != shape {
                return Err(PrepError::shape_mismatch(format!(
                    "motion array has shape {:?}, axes give {:?}",
                    field.dim(),
                    shape
                )));
            }
        }

        Ok(Self {
            days,
            x,
            y,
            latitude,
            longitude,
            u,
            v,
            open_handles: Arc::new(AtomicUsize::new(0)),
            opens: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Total number of `open` calls.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl MotionStore for InMemoryMotion {
    fn open<'a>(&'a self, _path: &Path) -> PrepResult<Box<dyn MotionHandle + 'a>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryMotionHandle { store: self }))
    }
}

struct InMemoryMotionHandle<'a> {
    store: &'a InMemoryMotion,
}

impl Drop for InMemoryMotionHandle<'_> {
    fn drop(&mut self) {
        self.store.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MotionHandle for InMemoryMotionHandle<'_> {
    fn times(&self) -> PrepResult<DayAxis> {
        Ok(DayAxis::new(self.store.days.clone()))
    }

    fn x(&self) -> PrepResult<Vec<f64>> {
        Ok(self.store.x.clone())
    }

    fn y(&self) -> PrepResult<Vec<f64>> {
        Ok(self.store.y.clone())
    }

    fn latitude(&self) -> PrepResult<Array2<f64>> {
        Ok(self.store.latitude.clone())
    }

    fn longitude(&self) -> PrepResult<Array2<f64>> {
        Ok(self.store.longitude.clone())
    }

    fn field(&self, name: &str, time_index: usize) -> PrepResult<Array2<f64>> {
        let frames = match name {
            variables::U => &self.store.u,
            variables::V => &self.store.v,
            _ => return Err(PrepError::source_read(name, "no such motion variable")),
        };
        frames.get(time_index).cloned().ok_or_else(|| {
            PrepError::source_read(name, format!("time index {} out of range", time_index))
        })
    }
}

// ============================================================================
// Sea-ice concentration
// ============================================================================

/// Concentration as stored by the product, before reprojection.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeConcentration {
    /// Per-cell geographic coordinates (swath products).
    Geographic {
        lat: Array2<f64>,
        lon: Array2<f64>,
        values: Array2<f64>,
    },
    /// 1-D projected axes; `values` has shape `(y.len(), x.len())`.
    Projected {
        x: Vec<f64>,
        y: Vec<f64>,
        values: Array2<f64>,
    },
}

impl NativeConcentration {
    pub fn values(&self) -> &Array2<f64> {
        match self {
            NativeConcentration::Geographic { values, .. } => values,
            NativeConcentration::Projected { values, .. } => values,
        }
    }

    /// Check that coordinates and values agree in shape.
    pub fn validate(&self) -> PrepResult<()> {
        match self {
            NativeConcentration::Geographic { lat, lon, values } => {
                if lat.dim() != values.dim() || lon.dim() != values.dim() {
                    return Err(PrepError::shape_mismatch(format!(
                        "concentration lat {:?} / lon {:?} do not match values {:?}",
                        lat.dim(),
                        lon.dim(),
                        values.dim()
                    )));
                }
            }
            NativeConcentration::Projected { x, y, values } => {
                if values.dim() != (y.len(), x.len()) {
                    return Err(PrepError::shape_mismatch(format!(
                        "concentration values {:?} do not match axes ({}, {})",
                        values.dim(),
                        y.len(),
                        x.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-date concentration product.
pub trait ConcentrationSource: Send + Sync {
    /// Where the product for `date` lives (reported when it is missing).
    fn locate(&self, date: NaiveDate, region: Region) -> PathBuf;
    fn exists(&self, date: NaiveDate, region: Region) -> bool;
    fn load(&self, date: NaiveDate, region: Region) -> PrepResult<NativeConcentration>;
}

/// Parses one concentration file.
pub trait ConcentrationReader: Send + Sync {
    fn read(&self, path: &Path) -> PrepResult<NativeConcentration>;
}

/// Concentration files laid out under a data root, one file per day.
pub struct DirectoryConcentrationSource {
    data_root: PathBuf,
    product: ConcentrationProduct,
    reader: Box<dyn ConcentrationReader>,
}

impl DirectoryConcentrationSource {
    pub fn new(
        data_root: impl Into<PathBuf>,
        product: ConcentrationProduct,
        reader: Box<dyn ConcentrationReader>,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            product,
            reader,
        }
    }

    pub fn product(&self) -> ConcentrationProduct {
        self.product
    }
}

impl ConcentrationSource for DirectoryConcentrationSource {
    fn locate(&self, date: NaiveDate, region: Region) -> PathBuf {
        let config = SourceConfig::new(self.data_root.clone(), region);
        self.product.path(&config, date)
    }

    fn exists(&self, date: NaiveDate, region: Region) -> bool {
        self.locate(date, region).is_file()
    }

    fn load(&self, date: NaiveDate, region: Region) -> PrepResult<NativeConcentration> {
        let path = self.locate(date, region);
        if !path.is_file() {
            return Err(PrepError::MissingSourceFile { path, date });
        }
        self.reader.read(&path)
    }
}

/// Concentration products held in memory, keyed by (region, date).
#[derive(Debug, Clone, Default)]
pub struct InMemoryConcentration {
    frames: HashMap<(Region, NaiveDate), NativeConcentration>,
}

impl InMemoryConcentration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: Region, date: NaiveDate, frame: NativeConcentration) {
        self.frames.insert((region, date), frame);
    }
}

impl ConcentrationSource for InMemoryConcentration {
    fn locate(&self, date: NaiveDate, region: Region) -> PathBuf {
        PathBuf::from(format!("memory/{}/{}", region.tag(), date.format("%Y%m%d")))
    }

    fn exists(&self, date: NaiveDate, region: Region) -> bool {
        self.frames.contains_key(&(region, date))
    }

    fn load(&self, date: NaiveDate, region: Region) -> PrepResult<NativeConcentration> {
        self.frames
            .get(&(region, date))
            .cloned()
            .ok_or_else(|| PrepError::MissingSourceFile {
                path: self.locate(date, region),
                date,
            })
    }
}

// ============================================================================
// Reanalysis
// ============================================================================

/// Reanalysis dataset on a regular latitude/longitude grid.
///
/// Fields are lat-major: shape `(latitude.len(), longitude.len())`.
pub trait ReanalysisSource: Send + Sync {
    fn latitude(&self) -> PrepResult<Vec<f64>>;
    fn longitude(&self) -> PrepResult<Vec<f64>>;
    /// Time axis in days since 1970-01-01.
    fn times(&self) -> PrepResult<DayAxis>;
    /// One of `t2m` (K), `u10`/`v10` (m/s) or `siconc` (fraction).
    fn field(&self, name: &str, time_index: usize) -> PrepResult<Array2<f64>>;
}

/// Reanalysis fields held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryReanalysis {
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    days: Vec<f64>,
    fields: HashMap<String, Vec<Array2<f64>>>,
}

impl InMemoryReanalysis {
    pub fn new(latitude: Vec<f64>, longitude: Vec<f64>, days: Vec<f64>) -> Self {
        Self {
            latitude,
            longitude,
            days,
            fields: HashMap::new(),
        }
    }

    /// Add one variable with a frame per time step.
    pub fn with_field(mut self, name: &str, frames: Vec<Array2<f64>>) -> Self {
        self.fields.insert(name.to_string(), frames);
        self
    }
}

impl ReanalysisSource for InMemoryReanalysis {
    fn latitude(&self) -> PrepResult<Vec<f64>> {
        Ok(self.latitude.clone())
    }

    fn longitude(&self) -> PrepResult<Vec<f64>> {
        Ok(self.longitude.clone())
    }

    fn times(&self) -> PrepResult<DayAxis> {
        Ok(DayAxis::new(self.days.clone()))
    }

    fn field(&self, name: &str, time_index: usize) -> PrepResult<Array2<f64>> {
        let frames = self
            .fields
            .get(name)
            .ok_or_else(|| PrepError::source_read(name, "no such reanalysis variable"))?;
        frames.get(time_index).cloned().ok_or_else(|| {
            PrepError::source_read(name, format!("time index {} out of range", time_index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_motion() -> InMemoryMotion {
        let grid = Array2::zeros((2, 3));
        InMemoryMotion::new(
            vec![0.0, 1.0],
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0],
            grid.clone(),
            grid.clone(),
            vec![grid.clone(), grid.clone()],
            vec![grid.clone(), grid],
        )
        .unwrap()
    }

    #[test]
    fn test_motion_handles_close_on_drop() {
        let motion = tiny_motion();
        {
            let handle = motion.open(Path::new("any.nc")).unwrap();
            assert_eq!(motion.open_handles(), 1);
            assert_eq!(handle.field("u", 1).unwrap().dim(), (2, 3));
            assert!(handle.field("w", 0).is_err());
            assert!(handle.field("v", 2).is_err());
        }
        assert_eq!(motion.open_handles(), 0);
        assert_eq!(motion.opens(), 1);
    }

    #[test]
    fn test_motion_shape_validation() {
        let grid = Array2::zeros((2, 3));
        let bad = Array2::zeros((3, 2));
        assert!(InMemoryMotion::new(
            vec![0.0],
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0],
            grid.clone(),
            grid.clone(),
            vec![bad],
            vec![grid],
        )
        .is_err());
    }

    #[test]
    fn test_in_memory_concentration_missing_date() {
        let mut source = InMemoryConcentration::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let frame = NativeConcentration::Projected {
            x: vec![0.0],
            y: vec![0.0],
            values: Array2::zeros((1, 1)),
        };
        source.insert(Region::North, date, frame);

        assert!(source.exists(date, Region::North));
        assert!(!source.exists(date, Region::South));
        let err = source.load(date.succ_opt().unwrap(), Region::North).unwrap_err();
        assert!(matches!(err, PrepError::MissingSourceFile { .. }));
    }

    #[test]
    fn test_native_concentration_validation() {
        let ok = NativeConcentration::Projected {
            x: vec![0.0, 1.0],
            y: vec![0.0],
            values: Array2::zeros((1, 2)),
        };
        assert!(ok.validate().is_ok());

        let bad = NativeConcentration::Geographic {
            lat: Array2::zeros((2, 2)),
            lon: Array2::zeros((2, 2)),
            values: Array2::zeros((2, 3)),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_reanalysis_fields() {
        let source = InMemoryReanalysis::new(vec![70.0], vec![0.0, 1.0], vec![5.0])
            .with_field(variables::T2M, vec![Array2::from_elem((1, 2), 250.0)]);
        assert_eq!(source.field("t2m", 0).unwrap()[[0, 1]], 250.0);
        assert!(source.field("t2m", 1).is_err());
        assert!(source.field("u10", 0).is_err());
        assert_eq!(source.times().unwrap().len(), 1);
    }
}
