//! Sequence packers: turn an ordered full-grid dataset into multi-step
//! training examples.
//!
//! Example `n` uses frames `n..n+horizon` as input and frame `n+horizon`
//! as the target, both cropped to the same window.

use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array4, Array5, ArrayD};
use num_traits::Zero;
use seaice_common::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};

/// Rectangular crop applied to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub row_start: usize,
    pub col_start: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Default for CropWindow {
    /// 320×320 starting at row 41, column 0.
    fn default() -> Self {
        Self {
            row_start: 41,
            col_start: 0,
            rows: 320,
            cols: 320,
        }
    }
}

impl CropWindow {
    pub fn new(row_start: usize, col_start: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_start,
            col_start,
            rows,
            cols,
        }
    }

    /// The whole grid.
    pub fn full(rows: usize, cols: usize) -> Self {
        Self::new(0, 0, rows, cols)
    }

    pub fn row_end(&self) -> usize {
        self.row_start + self.rows
    }

    pub fn col_end(&self) -> usize {
        self.col_start + self.cols
    }

    /// Fail unless the crop is non-empty and fits a `rows`×`cols` grid.
    pub fn check(&self, rows: usize, cols: usize) -> PrepResult<()> {
        if self.rows == 0 || self.cols == 0 || self.row_end() > rows || self.col_end() > cols {
            return Err(PrepError::shape_mismatch(format!(
                "crop rows {}..{} cols {}..{} does not fit grid ({}, {})",
                self.row_start,
                self.row_end(),
                self.col_start,
                self.col_end(),
                rows,
                cols
            )));
        }
        Ok(())
    }
}

/// Packing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackMode {
    /// Frames stacked on a separate time axis.
    Sequence,
    /// Frames concatenated along the channel axis.
    Multiframe,
}

impl PackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackMode::Sequence => "sequence",
            PackMode::Multiframe => "multiframe",
        }
    }
}

impl FromStr for PackMode {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequence" | "lstm" => Ok(PackMode::Sequence),
            "multiframe" | "cnn" => Ok(PackMode::Multiframe),
            other => Err(PrepError::configuration(format!("unknown pack mode: {}", other))),
        }
    }
}

impl fmt::Display for PackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`pack`], with the tensor rank erased.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedSamples<T> {
    pub mode: PackMode,
    pub horizon: usize,
    pub crop: CropWindow,
    pub input: ArrayD<T>,
    pub output: ArrayD<T>,
}

impl<T> PackedSamples<T> {
    pub fn len(&self) -> usize {
        self.input.shape().first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate a packing request and return the number of examples.
fn check_request<T>(
    inputs: &Array4<T>,
    outputs: &Array4<T>,
    horizon: usize,
    crop: &CropWindow,
) -> PrepResult<usize> {
    if horizon == 0 {
        return Err(PrepError::configuration("horizon must be at least 1"));
    }
    let (n, rows, cols, _) = inputs.dim();
    let (n_out, rows_out, cols_out, _) = outputs.dim();
    if n != n_out || rows != rows_out || cols != cols_out {
        return Err(PrepError::shape_mismatch(format!(
            "inputs {:?} and outputs {:?} disagree",
            inputs.dim(),
            outputs.dim()
        )));
    }
    if n <= horizon {
        return Err(PrepError::InsufficientSamples {
            available: n,
            horizon,
        });
    }
    crop.check(rows, cols)?;
    Ok(n - horizon)
}

/// Stack `horizon` consecutive frames on a time axis.
///
/// Returns `(examples, horizon, rows, cols, channels)` inputs and
/// `(examples, rows, cols, channels)` targets.
pub fn pack_sequence<T: Clone + Zero>(
    inputs: &Array4<T>,
    outputs: &Array4<T>,
    horizon: usize,
    crop: CropWindow,
) -> PrepResult<(Array5<T>, Array4<T>)> {
    let examples = check_request(inputs, outputs, horizon, &crop)?;
    let channels = inputs.dim().3;
    let (r0, r1, c0, c1) = (crop.row_start, crop.row_end(), crop.col_start, crop.col_end());

    let mut seq_input = Array5::<T>::zeros((examples, horizon, crop.rows, crop.cols, channels));
    for n in 0..examples {
        for t in 0..horizon {
            seq_input
                .slice_mut(s![n, t, .., .., ..])
                .assign(&inputs.slice(s![n + t, r0..r1, c0..c1, ..]));
        }
    }
    let seq_output = outputs.slice(s![horizon.., r0..r1, c0..c1, ..]).to_owned();
    Ok((seq_input, seq_output))
}

/// Concatenate `horizon` consecutive frames along the channel axis.
///
/// Input channel `frame * channels + channel` holds `channel` of the
/// `frame`-th step of the example.
pub fn pack_multiframe<T: Clone + Zero>(
    inputs: &Array4<T>,
    outputs: &Array4<T>,
    horizon: usize,
    crop: CropWindow,
) -> PrepResult<(Array4<T>, Array4<T>)> {
    let examples = check_request(inputs, outputs, horizon, &crop)?;
    let channels = inputs.dim().3;
    let (r0, r1, c0, c1) = (crop.row_start, crop.row_end(), crop.col_start, crop.col_end());

    let mut stacked = Array4::<T>::zeros((examples, crop.rows, crop.cols, horizon * channels));
    for n in 0..examples {
        for t in 0..horizon {
            stacked
                .slice_mut(s![n, .., .., t * channels..(t + 1) * channels])
                .assign(&inputs.slice(s![n + t, r0..r1, c0..c1, ..]));
        }
    }
    let target = outputs.slice(s![horizon.., r0..r1, c0..c1, ..]).to_owned();
    Ok((stacked, target))
}

/// Pack with the given mode.
pub fn pack<T: Clone + Zero>(
    mode: PackMode,
    inputs: &Array4<T>,
    outputs: &Array4<T>,
    horizon: usize,
    crop: CropWindow,
) -> PrepResult<PackedSamples<T>> {
    let (input, output) = match mode {
        PackMode::Sequence => {
            let (i, o) = pack_sequence(inputs, outputs, horizon, crop)?;
            (i.into_dyn(), o.into_dyn())
        }
        PackMode::Multiframe => {
            let (i, o) = pack_multiframe(inputs, outputs, horizon, crop)?;
            (i.into_dyn(), o.into_dyn())
        }
    };
    Ok(PackedSamples {
        mode,
        horizon,
        crop,
        input,
        output,
    })
}
