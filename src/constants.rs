//! Architecture constants shared by the encoder, the model, and the loaders.
//!
//! # Shape Invariants
//!
//! Every weight tensor and every padded input is shaped around three numbers:
//! the embedding width `D`, the pad width `P`, and the maximum sentence length.
//! The compile-time values below are the reference architecture. Use
//! [`ArchConfig`] to carry them through initialization and
//! [`ArchConfig::validate`] before loading anything that depends on them.

pub const DEFAULT_EMBED_DIMENSION: usize = 50;
pub const DEFAULT_COLUMN_PADDING: usize = 4;
pub const DEFAULT_MAX_SENTENCE_LENGTH: usize = 60;

/// Widest padded input the reference architecture ever builds.
pub const DEFAULT_MAX_PADDED_COLUMNS: usize =
    DEFAULT_MAX_SENTENCE_LENGTH + 2 * DEFAULT_COLUMN_PADDING;

/// Seed for the shared unknown-word vector.
pub const DEFAULT_UNKNOWN_SEED: u64 = 1234;
/// Unknown-word components are drawn from `[-UNKNOWN_WORD_RANGE, UNKNOWN_WORD_RANGE]`.
pub const UNKNOWN_WORD_RANGE: f32 = 0.25;

/// The classifier emits one logit per class: no-match, match.
pub const OUTPUT_CLASSES: usize = 2;
pub const MATCH_CLASS: usize = 1;

/// Post-activation scale applied to the hidden layer.
pub const HIDDEN_POST_SCALE: f64 = 2.0;

/// Runtime architecture configuration.
///
/// The [`validate`](ArchConfig::validate) method rejects shapes that could never
/// produce a well-formed padded input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchConfig {
    /// Embedding width `D` (rows of every padded input).
    pub embed_dimension: usize,
    /// Zero columns on each side of a sentence (`P`).
    pub column_padding: usize,
    /// Maximum number of tokens per sentence.
    pub max_sentence_length: usize,
}

impl Default for ArchConfig {
    fn default() -> Self {
        Self {
            embed_dimension: DEFAULT_EMBED_DIMENSION,
            column_padding: DEFAULT_COLUMN_PADDING,
            max_sentence_length: DEFAULT_MAX_SENTENCE_LENGTH,
        }
    }
}

impl ArchConfig {
    pub fn new(embed_dimension: usize, column_padding: usize, max_sentence_length: usize) -> Self {
        Self {
            embed_dimension,
            column_padding,
            max_sentence_length,
        }
    }

    /// Returns an error if:
    /// - `embed_dimension` is zero
    /// - `max_sentence_length` is zero
    pub fn validate(&self) -> Result<(), ArchValidationError> {
        if self.embed_dimension == 0 {
            return Err(ArchValidationError::ZeroDimension);
        }
        if self.max_sentence_length == 0 {
            return Err(ArchValidationError::ZeroSentenceLength);
        }
        Ok(())
    }

    /// Columns of a padded input holding `tokens` words.
    pub fn padded_columns(&self, tokens: usize) -> usize {
        tokens + 2 * self.column_padding
    }

    /// Widest filter window that stays inside the padded input for every token.
    pub fn max_window_width(&self) -> usize {
        self.column_padding + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchValidationError {
    ZeroDimension,
    ZeroSentenceLength,
}

impl std::fmt::Display for ArchValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::ZeroSentenceLength => write!(f, "maximum sentence length cannot be zero"),
        }
    }
}

impl std::error::Error for ArchValidationError {}
