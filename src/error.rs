//! Error taxonomy for the affect pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by every stage of the pipeline.
///
/// Nothing here is recovered internally: a failure never turns into a
/// default affect value.
#[derive(Debug, Error)]
pub enum AffectError {
    /// The audio file could not be opened, probed or decoded
    #[error("Failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Feature extraction failed on a decoded but degenerate waveform
    #[error("Feature extraction failed: {0}")]
    Feature(String),

    /// Descriptor or output shape does not match the network configuration
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// The weight file does not fit the declared architecture
    #[error("Weights in {path:?} do not match the network: {reason}")]
    WeightMismatch { path: PathBuf, reason: String },

    /// The weight file does not exist
    #[error("Model file not found: {0:?}")]
    ModelNotFound(PathBuf),

    /// Emotion catalog / cluster map integrity violation
    #[error("Invalid emotion tables: {0}")]
    Config(String),

    /// Tensor runtime failure during inference
    #[error("Tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl AffectError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        Self::Shape {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AffectError>;
