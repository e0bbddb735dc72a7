//! Assembled training samples.

use ndarray::{Array1, Array2, Array4, ArrayD};
use serde::{Deserialize, Serialize};

use crate::config::Layout;

/// Channels of an input sample at day `t`.
pub mod input_channels {
    pub const U: usize = 0;
    pub const V: usize = 1;
    pub const SIC: usize = 2;
    pub const T2M: usize = 3;
    pub const U10: usize = 4;
    pub const V10: usize = 5;
    pub const COUNT: usize = 6;
}

/// Channels of an output sample at day `t+1`.
pub mod output_channels {
    pub const U: usize = 0;
    pub const V: usize = 1;
    pub const SIC: usize = 2;
    pub const COUNT: usize = 3;
}

/// A requested time index that produced no samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedIndex {
    pub index: usize,
    /// Machine-readable failure label, e.g. `missing_source_file`.
    pub kind: String,
    pub reason: String,
}

/// Sample tensors of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// `(samples, rows, cols, channels)`; full grids or square windows.
    Grid {
        input: Array4<f32>,
        output: Array4<f32>,
    },
    /// `(samples, features)`; windows flattened row-major, then channel.
    Table {
        input: Array2<f32>,
        output: Array2<f32>,
    },
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Grid { input, .. } => input.shape()[0],
            Samples::Table { input, .. } => input.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Input tensor with its dimensionality erased.
    pub fn input_dyn(&self) -> ArrayD<f32> {
        match self {
            Samples::Grid { input, .. } => input.clone().into_dyn(),
            Samples::Table { input, .. } => input.clone().into_dyn(),
        }
    }

    /// Output tensor with its dimensionality erased.
    pub fn output_dyn(&self) -> ArrayD<f32> {
        match self {
            Samples::Grid { output, .. } => output.clone().into_dyn(),
            Samples::Table { output, .. } => output.clone().into_dyn(),
        }
    }
}

/// Ordered samples sharing one target grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub layout: Layout,
    /// `(rows, cols)` of the target grid.
    pub grid_shape: (usize, usize),
    pub samples: Samples,
    /// Target-CRS x of each windowed sample's centre cell. For the entire
    /// layout, the flattened grid x coordinates.
    pub xx: Array1<f64>,
    /// Target-CRS y, laid out like `xx`.
    pub yy: Array1<f64>,
    /// Requested time index of every sample.
    pub time_indices: Vec<usize>,
    pub skipped: Vec<SkippedIndex>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Grid tensors, if this is not a table dataset.
    pub fn grid_samples(&self) -> Option<(&Array4<f32>, &Array4<f32>)> {
        match &self.samples {
            Samples::Grid { input, output } => Some((input, output)),
            Samples::Table { .. } => None,
        }
    }

    /// Feature matrices, if this is a table dataset.
    pub fn table_samples(&self) -> Option<(&Array2<f32>, &Array2<f32>)> {
        match &self.samples {
            Samples::Table { input, output } => Some((input, output)),
            Samples::Grid { .. } => None,
        }
    }
}
