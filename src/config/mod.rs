//! Environment-backed configuration.
//!
//! Architecture numbers have reference defaults. Override with `COCONUT_*`
//! environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{
    ArchConfig, DEFAULT_COLUMN_PADDING, DEFAULT_EMBED_DIMENSION, DEFAULT_MAX_SENTENCE_LENGTH,
    DEFAULT_UNKNOWN_SEED,
};
use crate::model::Backend;

/// Scorer configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `COCONUT_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Weight file (record stream or `.safetensors`).
    pub weights_path: Option<PathBuf>,

    /// Embedding width `D`. Default: `50`.
    pub embed_dimension: usize,

    /// Zero columns on each side of a sentence. Default: `4`.
    pub column_padding: usize,

    /// Longest sentence accepted, in tokens. Default: `60`.
    pub max_sentence_length: usize,

    /// Seed for the unknown-word vector. Default: `1234`.
    pub unknown_seed: u64,

    /// Compute backend (`auto`, `cpu`, `metal`, `cuda`). Default: `auto`.
    pub device: Backend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights_path: None,
            embed_dimension: DEFAULT_EMBED_DIMENSION,
            column_padding: DEFAULT_COLUMN_PADDING,
            max_sentence_length: DEFAULT_MAX_SENTENCE_LENGTH,
            unknown_seed: DEFAULT_UNKNOWN_SEED,
            device: Backend::Auto,
        }
    }
}

impl Config {
    pub const ENV_WEIGHTS_PATH: &'static str = "COCONUT_WEIGHTS_PATH";
    pub const ENV_EMBED_DIMENSION: &'static str = "COCONUT_EMBED_DIMENSION";
    pub const ENV_COLUMN_PADDING: &'static str = "COCONUT_COLUMN_PADDING";
    pub const ENV_MAX_SENTENCE_LENGTH: &'static str = "COCONUT_MAX_SENTENCE_LENGTH";
    pub const ENV_UNKNOWN_SEED: &'static str = "COCONUT_UNKNOWN_SEED";
    pub const ENV_DEVICE: &'static str = "COCONUT_DEVICE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            weights_path: Self::parse_optional_path_from_env(Self::ENV_WEIGHTS_PATH),
            embed_dimension: Self::parse_from_env(
                Self::ENV_EMBED_DIMENSION,
                defaults.embed_dimension,
            )?,
            column_padding: Self::parse_from_env(
                Self::ENV_COLUMN_PADDING,
                defaults.column_padding,
            )?,
            max_sentence_length: Self::parse_from_env(
                Self::ENV_MAX_SENTENCE_LENGTH,
                defaults.max_sentence_length,
            )?,
            unknown_seed: Self::parse_from_env(Self::ENV_UNKNOWN_SEED, defaults.unknown_seed)?,
            device: match env::var(Self::ENV_DEVICE) {
                Ok(value) => value.parse()?,
                Err(_) => defaults.device,
            },
        })
    }

    /// Replaces the weight path when one is given explicitly.
    pub fn with_weights_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.weights_path = path;
        }
        self
    }

    /// Replaces the backend when one is given explicitly.
    pub fn with_device(mut self, device: Option<Backend>) -> Self {
        if let Some(device) = device {
            self.device = device;
        }
        self
    }

    pub fn arch(&self) -> ArchConfig {
        ArchConfig::new(
            self.embed_dimension,
            self.column_padding,
            self.max_sentence_length,
        )
    }

    /// Validates the architecture and the weight path (does not read the file).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arch().validate()?;

        let path = self
            .weights_path
            .as_deref()
            .ok_or(ConfigError::MissingWeights {
                name: Self::ENV_WEIGHTS_PATH,
            })?;
        require_file(path)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }
}

/// Checks that `path` exists and is a regular file.
pub fn require_file(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::PathNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
