use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The file declares wider vectors than the network accepts.
    #[error("embedding size ({declared}) is larger than allowed ({max})")]
    DimensionExceeded { declared: usize, max: usize },

    #[error("malformed embedding header: {reason}")]
    MalformedHeader { reason: String },

    #[error("embedding file truncated at entry {entry} of {vocab}")]
    Truncated { entry: usize, vocab: usize },

    #[error("embedding file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
