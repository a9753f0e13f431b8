//! The pair loop: read a question and an answer, score them, repeat.
//!
//! Pairs are scored strictly in input order. Lines the encoder rejects
//! (empty after tokenizing, or longer than the network accepts) are logged,
//! counted as skipped, and reported to the caller; the run continues.

mod error;
mod reader;
mod summary;


pub use error::PipelineError;
pub use reader::PairReader;
pub use summary::RunSummary;

use std::io::{self, BufRead, Write};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::embedding::EmbeddingTable;
use crate::model::{InferenceError, MatchModel, PairScore};

/// Result of one pair, borrowed for the duration of the callback.
pub type PairOutcome<'a> = Result<&'a PairScore, &'a InferenceError>;

/// Scores pairs against a loaded model and embedding table.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    model: &'a MatchModel,
    table: &'a EmbeddingTable,
}

impl<'a> Pipeline<'a> {
    pub fn new(model: &'a MatchModel, table: &'a EmbeddingTable) -> Self {
        Self { model, table }
    }

    pub fn score(&self, question: &str, answer: &str) -> Result<PairScore, InferenceError> {
        self.model.score_pair(self.table, question, answer)
    }

    /// Scores every pair from `pairs`, calling `on_pair` with each pair's index and outcome.
    pub fn run<Q, A, F>(
        &self,
        pairs: PairReader<Q, A>,
        mut on_pair: F,
    ) -> Result<RunSummary, PipelineError>
    where
        Q: BufRead,
        A: BufRead,
        F: FnMut(usize, PairOutcome<'_>) -> io::Result<()>,
    {
        let start = Instant::now();
        let mut scored = 0usize;
        let mut skipped = 0usize;

        for (index, pair) in pairs.enumerate() {
            let (question, answer) = pair?;

            match self.score(&question, &answer) {
                Ok(score) => {
                    scored += 1;
                    on_pair(index, Ok(&score))?;
                }
                Err(e) if e.is_recoverable() => {
                    warn!(pair = index, error = %e, "Skipping pair");
                    skipped += 1;
                    on_pair(index, Err(&e))?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let summary = RunSummary::new(scored, skipped, start.elapsed());
        info!(
            pairs = summary.pairs,
            scored = summary.scored,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed_ms,
            qps = summary.throughput(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Runs the loop and writes one line per pair to `out`: the score, or `skipped`.
    pub fn run_to_writer<Q, A, W>(
        &self,
        pairs: PairReader<Q, A>,
        out: &mut W,
    ) -> Result<RunSummary, PipelineError>
    where
        Q: BufRead,
        A: BufRead,
        W: Write,
    {
        let summary = self.run(pairs, |index, outcome| {
            debug!(pair = index, "Writing pair result");
            match outcome {
                Ok(score) => writeln!(out, "{score}"),
                Err(_) => writeln!(out, "skipped"),
            }
        })?;
        out.flush()?;
        Ok(summary)
    }
}
