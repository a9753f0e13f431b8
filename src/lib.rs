//! Coconut library crate (used by the `coconut` binary and integration tests).
//!
//! Scores question/answer pairs with a convolutional matching network over
//! pre-trained word embeddings.
//!
//! # Public API Surface
//!
//! ## Loading
//! - [`Config`], [`ConfigError`] - Environment configuration
//! - [`ArchConfig`] - Runtime network dimensions
//! - [`ParameterSet`], [`WeightError`] - Schema-validated network weights
//! - [`EmbeddingTable`], [`EmbeddingError`] - Word vectors with an unknown-word fallback
//!
//! ## Inference
//! - [`SequenceEncoder`], [`PaddedSequence`] - Line to padded embedding matrix
//! - [`MatchModel`], [`PairScore`], [`InferenceError`] - The forward pass
//!
//! ## Running
//! - [`Pipeline`], [`PairReader`], [`RunSummary`] - The sequential pair loop

pub mod config;
pub mod constants;
pub mod embedding;
pub mod encoder;
pub mod model;
pub mod pipeline;
pub mod weights;

pub use config::{Config, ConfigError};
pub use constants::{ArchConfig, ArchValidationError};
pub use embedding::{EmbeddingError, EmbeddingTable};
pub use encoder::{PaddedSequence, SequenceEncoder, tokenize};
pub use model::{Backend, DeviceError, InferenceError, MatchModel, PairScore, select_device};
pub use pipeline::{PairReader, Pipeline, PipelineError, RunSummary};
pub use weights::{Parameter, ParameterSet, TensorRecord, WeightError};
