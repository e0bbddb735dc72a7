//! Error types for the preparation pipeline.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using PrepError.
pub type PrepResult<T> = Result<T, PrepError>;

/// Primary error type shared by adapters, the assembler and the packers.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Unknown region/source/layout combination or invalid settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A source file for the requested date is absent.
    #[error("missing source file for {date}: {}", path.display())]
    MissingSourceFile { path: PathBuf, date: NaiveDate },

    /// Sequence packing asked for more history than samples exist.
    #[error("insufficient samples: {available} available, horizon {horizon} requires more")]
    InsufficientSamples { available: usize, horizon: usize },

    /// Grid or channel shapes disagree between sources or tensors.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A source collaborator failed to produce a variable.
    #[error("failed to read {variable}: {message}")]
    SourceRead { variable: String, message: String },

    /// Persisting or loading a dataset failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl PrepError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn source_read(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            variable: variable.into(),
            message: message.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the assembler may skip the affected time index and continue.
    ///
    /// Configuration and shape errors describe the run as a whole and are
    /// never skippable.
    pub fn is_per_index(&self) -> bool {
        matches!(
            self,
            PrepError::MissingSourceFile { .. } | PrepError::SourceRead { .. }
        )
    }

    /// Short machine-readable label recorded in dataset manifests.
    pub fn kind(&self) -> &'static str {
        match self {
            PrepError::Configuration(_) => "configuration",
            PrepError::MissingSourceFile { .. } => "missing_source_file",
            PrepError::InsufficientSamples { .. } => "insufficient_samples",
            PrepError::ShapeMismatch(_) => "shape_mismatch",
            PrepError::SourceRead { .. } => "source_read",
            PrepError::Storage(_) => "storage",
        }
    }
}

impl From<std::io::Error> for PrepError {
    fn from(err: std::io::Error) -> Self {
        PrepError::Storage(err.to_string())
    }
}
