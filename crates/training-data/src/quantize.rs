//! 16-bit fixed-point encoding of normalized samples.
//!
//! Each channel is shifted by an offset, clamped to `[-1, 1]` and scaled by
//! [`SCALE`]. Vector channels are shifted by -0.5, so an exact zero would
//! land on a non-zero code; those channels encode an exact zero as code 0
//! instead and keep code 0 for it alone.

use ndarray::{ArrayBase, ArrayD, Data, Dimension};
use seaice_common::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};

use crate::config::Layout;
use crate::dataset::Dataset;

/// Codes per unit of the shifted, clamped value.
pub const SCALE: f64 = 20_000.0;

/// Encoding rule of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRule {
    pub offset: f64,
    /// Encode an exact-zero input as code 0.
    pub zero_override: bool,
}

impl ChannelRule {
    pub const fn new(offset: f64, zero_override: bool) -> Self {
        Self {
            offset,
            zero_override,
        }
    }

    pub fn encode(&self, value: f64) -> i16 {
        if value.is_nan() {
            return 0;
        }
        let shifted = (value + self.offset).clamp(-1.0, 1.0);
        if self.zero_override && shifted == self.offset {
            return 0;
        }
        let code = (shifted * SCALE).trunc() as i16;
        if self.zero_override && code == 0 {
            // Code 0 decodes to the forced zero; use the nearest step instead
            return if shifted >= 0.0 { 1 } else { -1 };
        }
        code
    }

    pub fn decode(&self, code: i16) -> f64 {
        if self.zero_override && code == 0 {
            return 0.0;
        }
        code as f64 / SCALE - self.offset
    }
}

const INPUT_RULES: [ChannelRule; 6] = [
    ChannelRule::new(-0.5, true),
    ChannelRule::new(-0.5, true),
    ChannelRule::new(0.0, false),
    ChannelRule::new(0.0, false),
    ChannelRule::new(-0.5, true),
    ChannelRule::new(-0.5, true),
];

/// Per-channel rules for a channel-last tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizationScheme {
    rules: Vec<ChannelRule>,
}

impl QuantizationScheme {
    pub fn new(rules: Vec<ChannelRule>) -> Self {
        Self { rules }
    }

    /// Rules for the six input channels (u, v, sic, t2m, u10, v10).
    pub fn input() -> Self {
        Self::new(INPUT_RULES.to_vec())
    }

    /// Rules for the three output channels (u, v, sic).
    pub fn output() -> Self {
        Self::new(INPUT_RULES[..3].to_vec())
    }

    pub fn channels(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[ChannelRule] {
        &self.rules
    }

    /// Grid tensors must end in exactly one axis per channel; 2-D feature
    /// matrices interleave channels, so their width must be a multiple.
    fn check_channels(&self, shape: &[usize]) -> PrepResult<()> {
        let channels = self.rules.len();
        let last = shape.last().copied().unwrap_or(0);
        let fits = if shape.len() == 2 {
            channels > 0 && last % channels == 0
        } else {
            last == channels
        };
        if !fits {
            return Err(PrepError::shape_mismatch(format!(
                "tensor of shape {:?} does not carry {} channels",
                shape, channels
            )));
        }
        Ok(())
    }

    pub fn quantize<S, D>(&self, values: &ArrayBase<S, D>) -> PrepResult<ndarray::Array<i16, D>>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        self.check_channels(values.shape())?;
        let channels = self.rules.len();
        let codes: Vec<i16> = values
            .iter()
            .enumerate()
            .map(|(k, v)| self.rules[k % channels].encode(*v as f64))
            .collect();
        ndarray::Array::from_shape_vec(values.raw_dim(), codes)
            .map_err(|e| PrepError::shape_mismatch(e.to_string()))
    }

    pub fn dequantize<S, D>(&self, codes: &ArrayBase<S, D>) -> PrepResult<ndarray::Array<f32, D>>
    where
        S: Data<Elem = i16>,
        D: Dimension,
    {
        self.check_channels(codes.shape())?;
        let channels = self.rules.len();
        let values: Vec<f32> = codes
            .iter()
            .enumerate()
            .map(|(k, q)| self.rules[k % channels].decode(*q) as f32)
            .collect();
        ndarray::Array::from_shape_vec(codes.raw_dim(), values)
            .map_err(|e| PrepError::shape_mismatch(e.to_string()))
    }
}

/// A dataset encoded with the input and output schemes.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedSample {
    pub layout: Layout,
    pub grid_shape: (usize, usize),
    pub time_indices: Vec<usize>,
    pub input: ArrayD<i16>,
    pub output: ArrayD<i16>,
}

impl QuantizedSample {
    pub fn len(&self) -> usize {
        self.input.shape().first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Input and output schemes applied together.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantizer {
    pub input: QuantizationScheme,
    pub output: QuantizationScheme,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            input: QuantizationScheme::input(),
            output: QuantizationScheme::output(),
        }
    }
}

impl Quantizer {
    pub fn quantize(&self, dataset: &Dataset) -> PrepResult<QuantizedSample> {
        Ok(QuantizedSample {
            layout: dataset.layout,
            grid_shape: dataset.grid_shape,
            time_indices: dataset.time_indices.clone(),
            input: self.input.quantize(&dataset.samples.input_dyn())?,
            output: self.output.quantize(&dataset.samples.output_dyn())?,
        })
    }

    /// Decode both tensors back to normalized values.
    pub fn dequantize(&self, sample: &QuantizedSample) -> PrepResult<(ArrayD<f32>, ArrayD<f32>)> {
        Ok((
            self.input.dequantize(&sample.input)?,
            self.output.dequantize(&sample.output)?,
        ))
    }
}
