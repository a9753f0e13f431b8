use std::io;
use thiserror::Error;

use crate::model::InferenceError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An inference failure that is not confined to one pair.
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}
