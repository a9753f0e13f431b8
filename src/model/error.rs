use thiserror::Error;

use super::device::Backend;

/// Errors raised while opening the compute device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unknown device backend '{name}' (expected auto, cpu, metal or cuda)")]
    UnknownBackend { name: String },

    #[error("{backend} support is not compiled into this binary")]
    NotCompiled { backend: Backend },

    #[error("{backend} device unavailable: {source}")]
    Unavailable {
        backend: Backend,
        #[source]
        source: candle_core::Error,
    },
}

/// Errors raised while encoding or scoring one question/answer pair.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The line has more tokens than the network accepts.
    #[error("sequence has {tokens} tokens, maximum is {max}")]
    SequenceTooLong { tokens: usize, max: usize },

    /// The line has no tokens, so there is nothing to pool over.
    #[error("sequence has no tokens")]
    EmptySequence,

    #[error("embedding width {actual} does not match network width {expected}")]
    EmbeddingWidth { expected: usize, actual: usize },

    #[error("tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl InferenceError {
    /// Returns `true` for errors confined to a single input pair.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            InferenceError::SequenceTooLong { .. } | InferenceError::EmptySequence
        )
    }
}
