use std::time::Duration;

use serde::Serialize;

/// Totals for one run over a pair of input files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Pairs read from the inputs.
    pub pairs: usize,
    /// Pairs that produced a score.
    pub scored: usize,
    /// Pairs rejected by the encoder (empty or over-long lines).
    pub skipped: usize,
    pub elapsed_ms: f64,
}

impl RunSummary {
    pub fn new(scored: usize, skipped: usize, elapsed: Duration) -> Self {
        Self {
            pairs: scored + skipped,
            scored,
            skipped,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// Pairs per second; zero when no time elapsed.
    pub fn throughput(&self) -> f64 {
        if self.elapsed_ms > 0.0 {
            1000.0 * self.pairs as f64 / self.elapsed_ms
        } else {
            0.0
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        value["qps"] = serde_json::json!(self.throughput());
        serde_json::to_string(&value)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pairs in {:.3}ms or {:.1} qps",
            self.pairs,
            self.elapsed_ms,
            self.throughput()
        )?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        Ok(())
    }
}
