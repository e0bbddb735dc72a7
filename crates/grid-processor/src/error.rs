//! Error types for grid processing.

use seaice_common::PrepError;
use thiserror::Error;

/// Errors that can occur while resampling or filtering fields.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Source coordinates and values have different lengths.
    #[error("source length mismatch: {points} points, {values} values")]
    LengthMismatch { points: usize, values: usize },

    /// A field does not match the shape it is applied to.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridProcessorError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }
}

impl From<GridProcessorError> for PrepError {
    fn from(err: GridProcessorError) -> Self {
        match err {
            GridProcessorError::LengthMismatch { .. } | GridProcessorError::ShapeMismatch(_) => {
                PrepError::ShapeMismatch(err.to_string())
            }
            GridProcessorError::ConfigError(msg) => PrepError::Configuration(msg),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_into_prep_error() {
        let err: PrepError = GridProcessorError::LengthMismatch { points: 3, values: 4 }.into();
        assert!(matches!(err, PrepError::ShapeMismatch(_)));

        let err: PrepError = GridProcessorError::ConfigError("bad".into()).into();
        assert!(matches!(err, PrepError::Configuration(_)));
        assert!(!err.is_per_index());
    }
}
