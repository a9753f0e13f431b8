use serde::Serialize;

/// Output of one question/answer pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    /// Raw classifier outputs: no-match, match.
    pub logits: [f32; 2],
    /// Log-probability of the match class.
    pub match_log_prob: f32,
}

impl PairScore {
    /// Probability of the match class.
    pub fn probability(&self) -> f32 {
        self.match_log_prob.exp()
    }
}

impl std::fmt::Display for PairScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.match_log_prob)
    }
}
