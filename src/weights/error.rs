//! Weight loading error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or binding weight tensors.
///
/// Every variant is fatal: inference cannot start without a complete parameter set.
#[derive(Debug, Error)]
pub enum WeightError {
    /// The stream does not match the architecture (count, order, rank, or shape).
    #[error("weight schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    /// The stream bytes could not be decoded into records.
    #[error("malformed weight stream: {reason}")]
    Format { reason: String },

    #[error("weight file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl WeightError {
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            reason: reason.into(),
        }
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }
}

pub type WeightResult<T> = Result<T, WeightError>;
