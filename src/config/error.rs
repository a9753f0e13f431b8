//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::constants::ArchValidationError;
use crate::model::DeviceError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// The architecture numbers cannot describe a usable network.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(#[from] ArchValidationError),

    /// `COCONUT_DEVICE` names no known backend.
    #[error("invalid COCONUT_DEVICE: {0}")]
    InvalidDevice(#[from] DeviceError),

    /// No weight file was given on the command line or in the environment.
    #[error("no weight file configured (pass --weights or set {name})")]
    MissingWeights { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },
}
