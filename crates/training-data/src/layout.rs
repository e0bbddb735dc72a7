//! Masking and sample extraction for the three dataset layouts.
//!
//! Windowed layouts are filled in two passes: qualifying window centres are
//! collected for every frame first, then a pre-sized tensor is written in
//! frame order, row-major within a frame.

use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView3, Axis, Zip};
use seaice_common::{PrepError, PrepResult, TargetGrid};

use crate::config::Layout;
use crate::dataset::{input_channels, output_channels, Samples};

/// Normalized input/output tensors for one requested time index.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    /// `(rows, cols, 6)`: u, v, sic, t2m, u10, v10 at day `t`
    pub input: Array3<f64>,
    /// `(rows, cols, 3)`: u, v, sic at day `t+1`
    pub output: Array3<f64>,
}

impl Frame {
    pub fn new(index: usize, input: Array3<f64>, output: Array3<f64>) -> PrepResult<Self> {
        if input.dim().2 != input_channels::COUNT || output.dim().2 != output_channels::COUNT {
            return Err(PrepError::shape_mismatch(format!(
                "frame {} has {} input and {} output channels",
                index,
                input.dim().2,
                output.dim().2
            )));
        }
        if input.dim().0 != output.dim().0 || input.dim().1 != output.dim().1 {
            return Err(PrepError::shape_mismatch(format!(
                "frame {} input grid {:?} differs from output grid {:?}",
                index,
                input.dim(),
                output.dim()
            )));
        }
        Ok(Self { index, input, output })
    }

    pub fn shape(&self) -> (usize, usize) {
        let (rows, cols, _) = self.input.dim();
        (rows, cols)
    }

    /// Cells without ice at day `t`.
    pub fn input_mask(&self) -> Array2<bool> {
        no_ice_mask(self.input.index_axis(Axis(2), input_channels::SIC))
    }

    /// Cells without ice at day `t+1`.
    pub fn output_mask(&self) -> Array2<bool> {
        no_ice_mask(self.output.index_axis(Axis(2), output_channels::SIC))
    }
}

fn no_ice_mask(sic: ndarray::ArrayView2<f64>) -> Array2<bool> {
    sic.mapv(|v| v == 0.0)
}

/// Zero every channel of the masked cells.
pub fn apply_mask(tensor: &mut Array3<f64>, mask: &Array2<bool>) -> PrepResult<()> {
    let (rows, cols, _) = tensor.dim();
    if mask.dim() != (rows, cols) {
        return Err(PrepError::shape_mismatch(format!(
            "mask {:?} does not match tensor grid ({}, {})",
            mask.dim(),
            rows,
            cols
        )));
    }
    Zip::from(tensor.lanes_mut(Axis(2)))
        .and(mask)
        .for_each(|mut lane, &masked| {
            if masked {
                lane.fill(0.0);
            }
        });
    Ok(())
}

/// Cell layout: interior cells not masked at day `t`.
fn cell_centres(frame: &Frame, w: usize) -> Vec<(usize, usize)> {
    let (rows, cols) = frame.shape();
    let mask = frame.input_mask();
    let mut centres = Vec::new();
    for m in w..rows.saturating_sub(w) {
        for n in w..cols.saturating_sub(w) {
            if !mask[[m, n]] {
                centres.push((m, n));
            }
        }
    }
    centres
}

/// Table layout: interior cells whose input concentration window holds ice
/// in every cell.
fn table_centres(frame: &Frame, w: usize) -> Vec<(usize, usize)> {
    let (rows, cols) = frame.shape();
    let sic = frame.input.index_axis(Axis(2), input_channels::SIC);
    let mut centres = Vec::new();
    for m in w..rows.saturating_sub(w) {
        for n in w..cols.saturating_sub(w) {
            let window = sic.slice(s![m - w..=m + w, n - w..=n + w]);
            if window.iter().all(|&v| v > 0.0) {
                centres.push((m, n));
            }
        }
    }
    centres
}

fn window(tensor: &Array3<f64>, m: usize, n: usize, w: usize) -> ArrayView3<'_, f64> {
    tensor.slice(s![m - w..=m + w, n - w..=n + w, ..])
}

/// Samples and their coordinates produced from a list of frames.
#[derive(Debug, Clone)]
pub struct LaidOut {
    pub samples: Samples,
    pub xx: Array1<f64>,
    pub yy: Array1<f64>,
    pub time_indices: Vec<usize>,
}

/// Turn frames into samples according to `layout`.
///
/// `w` is the window half-width; it is ignored by the entire layout.
pub fn lay_out(frames: &[Frame], layout: Layout, w: usize, grid: &TargetGrid) -> PrepResult<LaidOut> {
    for frame in frames {
        if frame.shape() != grid.shape() {
            return Err(PrepError::shape_mismatch(format!(
                "frame {} has grid {:?}, target grid is {:?}",
                frame.index,
                frame.shape(),
                grid.shape()
            )));
        }
    }
    match layout {
        Layout::Entire => entire(frames, grid),
        Layout::Cell => windowed(frames, w, grid, false),
        Layout::Table => windowed(frames, w, grid, true),
    }
}

fn entire(frames: &[Frame], grid: &TargetGrid) -> PrepResult<LaidOut> {
    let (rows, cols) = grid.shape();
    let mut input = Array4::<f32>::zeros((frames.len(), rows, cols, input_channels::COUNT));
    let mut output = Array4::<f32>::zeros((frames.len(), rows, cols, output_channels::COUNT));

    for (k, frame) in frames.iter().enumerate() {
        let mut masked_in = frame.input.clone();
        let mut masked_out = frame.output.clone();
        apply_mask(&mut masked_in, &frame.input_mask())?;
        apply_mask(&mut masked_out, &frame.output_mask())?;
        input
            .index_axis_mut(Axis(0), k)
            .assign(&masked_in.mapv(|v| v as f32));
        output
            .index_axis_mut(Axis(0), k)
            .assign(&masked_out.mapv(|v| v as f32));
    }

    Ok(LaidOut {
        samples: Samples::Grid { input, output },
        xx: grid.x().iter().copied().collect(),
        yy: grid.y().iter().copied().collect(),
        time_indices: frames.iter().map(|f| f.index).collect(),
    })
}

fn windowed(frames: &[Frame], w: usize, grid: &TargetGrid, table: bool) -> PrepResult<LaidOut> {
    let centres: Vec<Vec<(usize, usize)>> = frames
        .iter()
        .map(|frame| {
            if table {
                table_centres(frame, w)
            } else {
                cell_centres(frame, w)
            }
        })
        .collect();
    let total: usize = centres.iter().map(Vec::len).sum();
    let size = 2 * w + 1;

    let mut input = Array4::<f32>::zeros((total, size, size, input_channels::COUNT));
    let mut output = Array4::<f32>::zeros((total, size, size, output_channels::COUNT));
    let mut xx = Array1::<f64>::zeros(total);
    let mut yy = Array1::<f64>::zeros(total);
    let mut time_indices = Vec::with_capacity(total);

    let mut k = 0;
    for (frame, cells) in frames.iter().zip(centres.iter()) {
        for &(m, n) in cells {
            input
                .index_axis_mut(Axis(0), k)
                .assign(&window(&frame.input, m, n, w).mapv(|v| v as f32));
            output
                .index_axis_mut(Axis(0), k)
                .assign(&window(&frame.output, m, n, w).mapv(|v| v as f32));
            xx[k] = grid.x()[[m, n]];
            yy[k] = grid.y()[[m, n]];
            time_indices.push(frame.index);
            k += 1;
        }
    }

    let samples = if table {
        let in_features = size * size * input_channels::COUNT;
        let out_features = size * size * output_channels::COUNT;
        Samples::Table {
            input: flatten(input, in_features)?,
            output: flatten(output, out_features)?,
        }
    } else {
        Samples::Grid { input, output }
    };

    Ok(LaidOut {
        samples,
        xx,
        yy,
        time_indices,
    })
}

/// Collapse `(n, r, c, ch)` into `(n, r*c*ch)` in row-major order.
fn flatten(windows: Array4<f32>, features: usize) -> PrepResult<Array2<f32>> {
    let n = windows.shape()[0];
    let values: Vec<f32> = windows.iter().copied().collect();
    Array2::from_shape_vec((n, features), values)
        .map_err(|e| PrepError::shape_mismatch(format!("cannot flatten windows: {}", e)))
}
