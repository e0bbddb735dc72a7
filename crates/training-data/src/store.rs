//! Zarr V3 persistence for datasets, quantized samples and packed sequences.
//!
//! A stored dataset is a directory:
//!
//! ```text
//! <dir>/
//! ├── manifest.json
//! ├── input.zarr/
//! ├── output.zarr/
//! ├── xx.zarr/     (datasets only)
//! └── yy.zarr/     (datasets only)
//! ```
//!
//! Arrays are uncompressed and chunked along the leading (sample) axis.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::{ArrayD, Ix1, Ix2, Ix4, IxDyn};
use num_traits::Zero;
use seaice_common::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zarrs::array::{Array, ArrayBuilder, DataType, Element, ElementOwned, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::config::{Layout, StoreConfig};
use crate::dataset::{Dataset, Samples, SkippedIndex};
use crate::quantize::QuantizedSample;
use crate::sequence::{CropWindow, PackMode, PackedSamples};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const INPUT_ARRAY: &str = "input.zarr";
pub const OUTPUT_ARRAY: &str = "output.zarr";
pub const XX_ARRAY: &str = "xx.zarr";
pub const YY_ARRAY: &str = "yy.zarr";

/// Element types that can be stored.
pub trait StoredElement: Element + ElementOwned + Copy + Zero + Send + Sync + 'static {
    /// Name recorded in the manifest.
    const DTYPE: &'static str;

    fn data_type() -> DataType;

    fn fill_value() -> FillValue;
}

impl StoredElement for f32 {
    const DTYPE: &'static str = "float32";

    fn data_type() -> DataType {
        DataType::Float32
    }

    fn fill_value() -> FillValue {
        FillValue::from(f32::NAN)
    }
}

impl StoredElement for f64 {
    const DTYPE: &'static str = "float64";

    fn data_type() -> DataType {
        DataType::Float64
    }

    fn fill_value() -> FillValue {
        FillValue::from(f64::NAN)
    }
}

impl StoredElement for i16 {
    const DTYPE: &'static str = "int16";

    fn data_type() -> DataType {
        DataType::Int16
    }

    fn fill_value() -> FillValue {
        FillValue::from(0i16)
    }
}

/// What a stored directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Dataset,
    Quantized,
    Packed,
}

/// Packing parameters of a packed directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingInfo {
    pub mode: PackMode,
    pub horizon: usize,
    pub crop: CropWindow,
}

/// Sidecar describing a stored directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub content: ContentKind,
    pub layout: Layout,
    pub dtype: String,
    pub grid_shape: (usize, usize),
    pub samples: usize,
    pub time_indices: Vec<usize>,
    #[serde(default)]
    pub skipped: Vec<SkippedIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packing: Option<PackingInfo>,
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    fn require(&self, content: ContentKind, dtype: &str) -> PrepResult<()> {
        if self.content != content || self.dtype != dtype {
            return Err(PrepError::storage(format!(
                "directory holds {:?} {}, expected {:?} {}",
                self.content, self.dtype, content, dtype
            )));
        }
        Ok(())
    }
}

/// Reads and writes stored directories.
pub struct DatasetStore {
    config: StoreConfig,
}

impl DatasetStore {
    pub fn new(config: StoreConfig) -> PrepResult<Self> {
        config.validate().map_err(PrepError::configuration)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory of a named dataset under the store root.
    pub fn path(&self, name: &str) -> PathBuf {
        self.config.root.join(name)
    }

    pub fn write_dataset(&self, dir: &Path, dataset: &Dataset) -> PrepResult<Manifest> {
        self.prepare(dir)?;
        write_array(dir, INPUT_ARRAY, &dataset.samples.input_dyn(), self.config.chunk_samples)?;
        write_array(dir, OUTPUT_ARRAY, &dataset.samples.output_dyn(), self.config.chunk_samples)?;
        write_array(dir, XX_ARRAY, &dataset.xx.clone().into_dyn(), self.config.chunk_samples)?;
        write_array(dir, YY_ARRAY, &dataset.yy.clone().into_dyn(), self.config.chunk_samples)?;

        let manifest = Manifest {
            content: ContentKind::Dataset,
            layout: dataset.layout,
            dtype: f32::DTYPE.to_string(),
            grid_shape: dataset.grid_shape,
            samples: dataset.len(),
            time_indices: dataset.time_indices.clone(),
            skipped: dataset.skipped.clone(),
            packing: None,
            created_at: Utc::now(),
        };
        write_manifest(dir, &manifest)?;
        info!(
            path = %dir.display(),
            layout = %dataset.layout,
            samples = dataset.len(),
            skipped = dataset.skipped.len(),
            "Wrote dataset"
        );
        Ok(manifest)
    }

    pub fn read_dataset(&self, dir: &Path) -> PrepResult<Dataset> {
        let manifest = self.read_manifest(dir)?;
        manifest.require(ContentKind::Dataset, f32::DTYPE)?;

        let input = read_array::<f32>(dir, INPUT_ARRAY)?;
        let output = read_array::<f32>(dir, OUTPUT_ARRAY)?;
        let samples = match manifest.layout {
            Layout::Table => Samples::Table {
                input: into_rank::<f32, Ix2>(input, INPUT_ARRAY)?,
                output: into_rank::<f32, Ix2>(output, OUTPUT_ARRAY)?,
            },
            Layout::Entire | Layout::Cell => Samples::Grid {
                input: into_rank::<f32, Ix4>(input, INPUT_ARRAY)?,
                output: into_rank::<f32, Ix4>(output, OUTPUT_ARRAY)?,
            },
        };
        let xx = into_rank::<f64, Ix1>(read_array::<f64>(dir, XX_ARRAY)?, XX_ARRAY)?;
        let yy = into_rank::<f64, Ix1>(read_array::<f64>(dir, YY_ARRAY)?, YY_ARRAY)?;

        Ok(Dataset {
            layout: manifest.layout,
            grid_shape: manifest.grid_shape,
            samples,
            xx,
            yy,
            time_indices: manifest.time_indices,
            skipped: manifest.skipped,
        })
    }

    pub fn write_quantized(&self, dir: &Path, sample: &QuantizedSample) -> PrepResult<Manifest> {
        self.prepare(dir)?;
        write_array(dir, INPUT_ARRAY, &sample.input, self.config.chunk_samples)?;
        write_array(dir, OUTPUT_ARRAY, &sample.output, self.config.chunk_samples)?;

        let manifest = Manifest {
            content: ContentKind::Quantized,
            layout: sample.layout,
            dtype: i16::DTYPE.to_string(),
            grid_shape: sample.grid_shape,
            samples: sample.len(),
            time_indices: sample.time_indices.clone(),
            skipped: Vec::new(),
            packing: None,
            created_at: Utc::now(),
        };
        write_manifest(dir, &manifest)?;
        info!(path = %dir.display(), samples = sample.len(), "Wrote quantized samples");
        Ok(manifest)
    }

    pub fn read_quantized(&self, dir: &Path) -> PrepResult<QuantizedSample> {
        let manifest = self.read_manifest(dir)?;
        manifest.require(ContentKind::Quantized, i16::DTYPE)?;
        Ok(QuantizedSample {
            layout: manifest.layout,
            grid_shape: manifest.grid_shape,
            time_indices: manifest.time_indices,
            input: read_array::<i16>(dir, INPUT_ARRAY)?,
            output: read_array::<i16>(dir, OUTPUT_ARRAY)?,
        })
    }

    /// Write packed examples; `source` is the manifest they were packed from.
    pub fn write_packed<T: StoredElement>(
        &self,
        dir: &Path,
        packed: &PackedSamples<T>,
        source: &Manifest,
    ) -> PrepResult<Manifest> {
        self.prepare(dir)?;
        write_array(dir, INPUT_ARRAY, &packed.input, self.config.chunk_samples)?;
        write_array(dir, OUTPUT_ARRAY, &packed.output, self.config.chunk_samples)?;

        // Each example is labelled with the time index of its target frame
        let time_indices = source
            .time_indices
            .iter()
            .skip(packed.horizon)
            .copied()
            .collect();
        let manifest = Manifest {
            content: ContentKind::Packed,
            layout: source.layout,
            dtype: T::DTYPE.to_string(),
            grid_shape: source.grid_shape,
            samples: packed.len(),
            time_indices,
            skipped: source.skipped.clone(),
            packing: Some(PackingInfo {
                mode: packed.mode,
                horizon: packed.horizon,
                crop: packed.crop,
            }),
            created_at: Utc::now(),
        };
        write_manifest(dir, &manifest)?;
        info!(
            path = %dir.display(),
            mode = %packed.mode,
            horizon = packed.horizon,
            examples = packed.len(),
            "Wrote packed examples"
        );
        Ok(manifest)
    }

    pub fn read_packed<T: StoredElement>(&self, dir: &Path) -> PrepResult<PackedSamples<T>> {
        let manifest = self.read_manifest(dir)?;
        manifest.require(ContentKind::Packed, T::DTYPE)?;
        let packing = manifest
            .packing
            .ok_or_else(|| PrepError::storage("packed manifest has no packing section"))?;
        Ok(PackedSamples {
            mode: packing.mode,
            horizon: packing.horizon,
            crop: packing.crop,
            input: read_array::<T>(dir, INPUT_ARRAY)?,
            output: read_array::<T>(dir, OUTPUT_ARRAY)?,
        })
    }

    pub fn read_manifest(&self, dir: &Path) -> PrepResult<Manifest> {
        let path = dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path)
            .map_err(|e| PrepError::storage(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| PrepError::storage(format!("invalid manifest {}: {}", path.display(), e)))
    }

    /// Create `dir`, clearing it first when overwriting is allowed.
    fn prepare(&self, dir: &Path) -> PrepResult<()> {
        if dir.join(MANIFEST_FILE).exists() {
            if !self.config.overwrite {
                return Err(PrepError::storage(format!(
                    "{} already holds a dataset",
                    dir.display()
                )));
            }
            debug!(path = %dir.display(), "Replacing stored dataset");
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }
}

fn write_manifest(dir: &Path, manifest: &Manifest) -> PrepResult<()> {
    let text = serde_json::to_string_pretty(manifest)
        .map_err(|e| PrepError::storage(format!("cannot encode manifest: {}", e)))?;
    fs::write(dir.join(MANIFEST_FILE), text)?;
    Ok(())
}

fn write_array<T: StoredElement>(
    dir: &Path,
    name: &str,
    data: &ArrayD<T>,
    chunk_samples: usize,
) -> PrepResult<()> {
    let path = dir.join(name);
    fs::create_dir_all(&path)?;
    let store = Arc::new(FilesystemStore::new(&path).map_err(|e| PrepError::storage(e.to_string()))?);

    let shape: Vec<u64> = data.shape().iter().map(|&d| d as u64).collect();
    let mut chunk: Vec<u64> = shape.iter().map(|&d| d.max(1)).collect();
    if let Some(leading) = chunk.first_mut() {
        *leading = chunk_samples as u64;
    }
    let chunk_grid: zarrs::array::ChunkGrid = chunk
        .try_into()
        .map_err(|e| PrepError::storage(format!("{:?}", e)))?;

    let mut attrs = serde_json::Map::new();
    attrs.insert("dtype".to_string(), serde_json::json!(T::DTYPE));

    let array = ArrayBuilder::new(shape.clone(), T::data_type(), chunk_grid, T::fill_value())
        .attributes(attrs)
        .build(store, "/")
        .map_err(|e| PrepError::storage(e.to_string()))?;
    array
        .store_metadata()
        .map_err(|e| PrepError::storage(e.to_string()))?;

    if data.is_empty() {
        return Ok(());
    }
    let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)
        .map_err(|e| PrepError::storage(e.to_string()))?;
    let elements: Vec<T> = data.iter().copied().collect();
    array
        .store_array_subset_elements(&subset, &elements)
        .map_err(|e| PrepError::storage(e.to_string()))?;
    Ok(())
}

fn read_array<T: StoredElement>(dir: &Path, name: &str) -> PrepResult<ArrayD<T>> {
    let path = dir.join(name);
    if !path.is_dir() {
        return Err(PrepError::storage(format!("missing array {}", path.display())));
    }
    let store = Arc::new(FilesystemStore::new(&path).map_err(|e| PrepError::storage(e.to_string()))?);
    let array = Array::open(store, "/").map_err(|e| PrepError::storage(e.to_string()))?;
    if array.data_type() != &T::data_type() {
        return Err(PrepError::storage(format!(
            "{} has data type {:?}, expected {}",
            name,
            array.data_type(),
            T::DTYPE
        )));
    }

    let shape: Vec<usize> = array.shape().iter().map(|&d| d as usize).collect();
    if shape.iter().any(|&d| d == 0) {
        return ArrayD::from_shape_vec(IxDyn(&shape), Vec::new())
            .map_err(|e| PrepError::storage(e.to_string()));
    }
    let subset = ArraySubset::new_with_shape(array.shape().to_vec());
    let values: Vec<T> = array
        .retrieve_array_subset_elements(&subset)
        .map_err(|e| PrepError::storage(e.to_string()))?;
    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| PrepError::storage(e.to_string()))
}

fn into_rank<T, D: ndarray::Dimension>(array: ArrayD<T>, name: &str) -> PrepResult<ndarray::Array<T, D>> {
    let shape = array.shape().to_vec();
    array.into_dimensionality::<D>().map_err(|_| {
        PrepError::storage(format!("{} has unexpected shape {:?}", name, shape))
    })
}
