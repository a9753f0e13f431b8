use candle_core::{Result, Tensor};

use crate::encoder::PaddedSequence;

/// Convolution + max-over-time pooling + tanh for one sentence.
///
/// Window `k` of a sentence with `L` tokens covers padded columns
/// `[k + P, k + P + W)` for `k` in `0..L`. Responses are raw sums of the
/// elementwise product of filter and window.
#[derive(Debug, Clone)]
pub struct ConvBranch {
    /// Flattened filters, transposed to `(D * W, F)`.
    kernel: Tensor,
    biases: Tensor,
    filter_count: usize,
    depth: usize,
    window: usize,
}

impl ConvBranch {
    /// `filters` is `(F, D, W)`, `biases` is `(F)`.
    pub fn new(filters: &Tensor, biases: Tensor) -> Result<Self> {
        let (filter_count, depth, window) = filters.dims3()?;
        let kernel = filters
            .reshape((filter_count, depth * window))?
            .t()?
            .contiguous()?;
        Ok(Self {
            kernel,
            biases,
            filter_count,
            depth,
            window,
        })
    }

    pub fn filter_count(&self) -> usize {
        self.filter_count
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Per-window responses, `(L, F)`.
    ///
    /// Each window is unrolled to a `D * W` row so one matmul yields every
    /// filter/window product sum.
    pub fn responses(&self, input: &PaddedSequence) -> Result<Tensor> {
        let offset = input.padding();
        let windows = (0..input.token_count())
            .map(|k| {
                input
                    .tensor()
                    .narrow(1, k + offset, self.window)?
                    .flatten_all()
            })
            .collect::<Result<Vec<_>>>()?;
        Tensor::stack(&windows, 0)?.matmul(&self.kernel)
    }

    /// Max-over-time pooled responses, `(F)`.
    pub fn pool(&self, input: &PaddedSequence) -> Result<Tensor> {
        self.responses(input)?.max(0)
    }

    /// Sentence encoding: `tanh(pool + biases)`, `(F)`.
    pub fn forward(&self, input: &PaddedSequence) -> Result<Tensor> {
        (self.pool(input)? + &self.biases)?.tanh()
    }
}
