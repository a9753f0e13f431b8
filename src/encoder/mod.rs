//! Padded input builder.
//!
//! A line becomes a `D x (L + 2P)` matrix: `P` zero columns, one column per
//! token (its embedding, or the unknown vector), then `P` zero columns.

#[cfg(test)]
mod tests;

use candle_core::{Device, Tensor};
use tracing::debug;

use crate::constants::ArchConfig;
use crate::embedding::EmbeddingTable;
use crate::model::InferenceError;

/// Splits a line on whitespace. An empty line has no tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Zero-padded embedding matrix for one sentence.
#[derive(Debug, Clone)]
pub struct PaddedSequence {
    tensor: Tensor,
    token_count: usize,
    padding: usize,
}

impl PaddedSequence {
    /// The `D x (L + 2P)` matrix.
    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn columns(&self) -> usize {
        self.token_count + 2 * self.padding
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SequenceEncoder {
    arch: ArchConfig,
}

impl SequenceEncoder {
    pub fn new(arch: ArchConfig) -> Self {
        Self { arch }
    }

    pub fn arch(&self) -> &ArchConfig {
        &self.arch
    }

    pub fn encode(
        &self,
        table: &EmbeddingTable,
        line: &str,
        device: &Device,
    ) -> Result<PaddedSequence, InferenceError> {
        self.encode_tokens(table, &tokenize(line), device)
    }

    /// Builds the padded matrix, rejecting empty and over-long sentences.
    pub fn encode_tokens(
        &self,
        table: &EmbeddingTable,
        tokens: &[&str],
        device: &Device,
    ) -> Result<PaddedSequence, InferenceError> {
        let dim = self.arch.embed_dimension;
        if table.dim() != dim {
            return Err(InferenceError::EmbeddingWidth {
                expected: dim,
                actual: table.dim(),
            });
        }
        if tokens.is_empty() {
            return Err(InferenceError::EmptySequence);
        }
        if tokens.len() > self.arch.max_sentence_length {
            return Err(InferenceError::SequenceTooLong {
                tokens: tokens.len(),
                max: self.arch.max_sentence_length,
            });
        }

        let mut columns = Vec::with_capacity(tokens.len() * dim);
        let mut unknown = 0usize;
        for token in tokens {
            if !table.contains(token) {
                unknown += 1;
            }
            columns.extend_from_slice(table.lookup(token));
        }
        debug!(tokens = tokens.len(), unknown, "Encoding sentence");

        // Rows of `columns` are tokens; transpose so each token is a column.
        let padding = self.arch.column_padding;
        let tensor = Tensor::from_vec(columns, (tokens.len(), dim), device)?
            .t()?
            .contiguous()?
            .pad_with_zeros(1, padding, padding)?;

        Ok(PaddedSequence {
            tensor,
            token_count: tokens.len(),
            padding,
        })
    }
}
