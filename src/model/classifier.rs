use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module};

use crate::constants::{HIDDEN_POST_SCALE, MATCH_CLASS};

/// Dense head over the joined sentence encodings.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// `(J, H)`: inputs along rows.
    hidden_weights: Tensor,
    hidden_biases: Tensor,
    /// Weights stored `(2, H)`, applied as `x · Wᵀ + b`.
    output: Linear,
}

impl Classifier {
    pub fn new(
        hidden_weights: Tensor,
        hidden_biases: Tensor,
        softmax_weights: Tensor,
        softmax_biases: Tensor,
    ) -> Self {
        Self {
            hidden_weights,
            hidden_biases,
            output: Linear::new(softmax_weights, Some(softmax_biases)),
        }
    }

    /// Width of the join vector `W` expects (rows of the hidden weights).
    pub fn input_width(&self) -> usize {
        self.hidden_weights.dims().first().copied().unwrap_or(0)
    }

    /// `tanh(join · W + b) * 2`, `(1, H)`.
    pub fn hidden(&self, join: &Tensor) -> Result<Tensor> {
        join.unsqueeze(0)?
            .matmul(&self.hidden_weights)?
            .broadcast_add(&self.hidden_biases)?
            .tanh()?
            .affine(HIDDEN_POST_SCALE, 0.0)
    }

    /// Output logits `(2)`: no-match, match.
    pub fn logits(&self, join: &Tensor) -> Result<Tensor> {
        self.output.forward(&self.hidden(join)?)?.squeeze(0)
    }
}

/// Log-probability of the match class from the two logits.
///
/// Shifted by the max logit before exponentiating, so large logits stay finite.
pub fn match_log_probability(logits: &Tensor) -> Result<f32> {
    let shifted = logits.broadcast_sub(&logits.max_keepdim(0)?)?;
    let log_sum = shifted.exp()?.sum_all()?.log()?.to_scalar::<f32>()?;
    let shifted = shifted.to_vec1::<f32>()?;
    Ok(shifted[MATCH_CLASS] - log_sum)
}
