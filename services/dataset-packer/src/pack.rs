//! Packing of a stored full-grid dataset.

use anyhow::{bail, Context, Result};
use ndarray::{ArrayD, Ix4};
use std::path::Path;
use tracing::info;

use training_data::{
    pack, ContentKind, DatasetStore, Layout, Manifest, Quantizer, StoreConfig, StoredElement,
};

use crate::config::PackerConfig;

/// Read the dataset at `input`, pack it and write the examples to `output`.
pub fn run(config: &PackerConfig, input: &Path, output: &Path) -> Result<Manifest> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid packer config: {}", e))?;

    let store = DatasetStore::new(StoreConfig {
        overwrite: config.overwrite,
        ..StoreConfig::default()
    })?;
    let manifest = store
        .read_manifest(input)
        .with_context(|| format!("Failed to open dataset {}", input.display()))?;

    if manifest.layout != Layout::Entire {
        bail!(
            "Only {} datasets can be packed, {} holds a {} dataset",
            Layout::Entire,
            input.display(),
            manifest.layout
        );
    }

    info!(
        input = %input.display(),
        content = ?manifest.content,
        samples = manifest.samples,
        mode = %config.mode,
        horizon = config.horizon,
        quantize = config.quantize,
        "Packing dataset"
    );

    match manifest.content {
        ContentKind::Dataset if config.quantize => {
            let dataset = store.read_dataset(input)?;
            let quantized = Quantizer::default().quantize(&dataset)?;
            write(&store, config, &manifest, quantized.input, quantized.output, output)
        }
        ContentKind::Dataset => {
            let dataset = store.read_dataset(input)?;
            let (inputs, outputs) = dataset
                .grid_samples()
                .context("Entire dataset without grid samples")?;
            write(
                &store,
                config,
                &manifest,
                inputs.clone().into_dyn(),
                outputs.clone().into_dyn(),
                output,
            )
        }
        ContentKind::Quantized => {
            let quantized = store.read_quantized(input)?;
            write(&store, config, &manifest, quantized.input, quantized.output, output)
        }
        ContentKind::Packed => bail!("{} is already packed", input.display()),
    }
}

fn write<T: StoredElement>(
    store: &DatasetStore,
    config: &PackerConfig,
    source: &Manifest,
    inputs: ArrayD<T>,
    outputs: ArrayD<T>,
    output: &Path,
) -> Result<Manifest> {
    let inputs = inputs
        .into_dimensionality::<Ix4>()
        .context("Stored inputs are not (samples, rows, cols, channels)")?;
    let outputs = outputs
        .into_dimensionality::<Ix4>()
        .context("Stored outputs are not (samples, rows, cols, channels)")?;

    let crop = config.crop_for(source.grid_shape);
    let packed = pack(config.mode, &inputs, &outputs, config.horizon, crop)?;
    let manifest = store.write_packed(output, &packed, source)?;

    info!(
        output = %output.display(),
        examples = manifest.samples,
        dtype = %manifest.dtype,
        "Packed dataset"
    );
    Ok(manifest)
}
