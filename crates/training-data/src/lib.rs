//! Training-sample assembly for the sea-ice motion model.
//!
//! Pairs each day's ice motion, concentration and near-surface weather with
//! the next day's motion and concentration, on the motion product's grid:
//!
//! - [`assembler`]: loads sources per time index and builds a [`Dataset`]
//! - [`layout`]: whole-grid, per-cell or flat-table sample layouts
//! - [`sequence`]: packs consecutive frames into sequence or multi-frame
//!   examples
//! - [`quantize`]: 16-bit encoding of normalized channels
//! - [`metrics`]: NaN-aware MAE and correlation
//! - [`store`]: Zarr arrays plus a JSON manifest on disk

pub mod assembler;
pub mod config;
pub mod dataset;
pub mod layout;
pub mod metrics;
pub mod quantize;
pub mod sequence;
pub mod store;

// Re-exports
pub use assembler::DatasetAssembler;
pub use config::{AssemblyConfig, ConcentrationOrigin, Layout, StoreConfig};
pub use dataset::{input_channels, output_channels, Dataset, Samples, SkippedIndex};
pub use layout::{apply_mask, lay_out, Frame, LaidOut};
pub use metrics::{corr, mae};
pub use quantize::{ChannelRule, QuantizationScheme, QuantizedSample, Quantizer};
pub use sequence::{pack, pack_multiframe, pack_sequence, CropWindow, PackMode, PackedSamples};
pub use store::{ContentKind, DatasetStore, Manifest, PackingInfo, StoredElement};
