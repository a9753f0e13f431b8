//! The question/answer matching network.
//!
//! [`MatchModel`] owns one [`ConvBranch`] per sentence kind and the
//! [`Classifier`] over their joined encodings. Shapes are checked when the
//! [`ParameterSet`] is bound, so the forward pass only fails on bad input lines.

pub mod branch;
pub mod classifier;
pub mod device;
mod error;
pub mod types;


pub use branch::ConvBranch;
pub use classifier::{Classifier, match_log_probability};
pub use device::{Backend, select_device};
pub use error::{DeviceError, InferenceError};
pub use types::PairScore;

use candle_core::{Device, Tensor};
use tracing::debug;

use crate::constants::ArchConfig;
use crate::embedding::EmbeddingTable;
use crate::encoder::{PaddedSequence, SequenceEncoder};
use crate::weights::{Parameter, ParameterSet, WeightResult};

pub struct MatchModel {
    device: Device,
    encoder: SequenceEncoder,
    question: ConvBranch,
    answer: ConvBranch,
    classifier: Classifier,
}

impl std::fmt::Debug for MatchModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchModel")
            .field("device", &format!("{:?}", self.device))
            .field("arch", self.encoder.arch())
            .field("question_filters", &self.question.filter_count())
            .field("answer_filters", &self.answer.filter_count())
            .finish()
    }
}

impl MatchModel {
    /// Moves a validated parameter set onto `device`.
    pub fn new(params: &ParameterSet, arch: ArchConfig, device: Device) -> WeightResult<Self> {
        let tensor = |p: Parameter| params.get(p).to_tensor(&device);

        let question = ConvBranch::new(
            &tensor(Parameter::QuestionConvolutionFilters)?,
            tensor(Parameter::QuestionConvolutionBiases)?,
        )?;
        let answer = ConvBranch::new(
            &tensor(Parameter::AnswerConvolutionFilters)?,
            tensor(Parameter::AnswerConvolutionBiases)?,
        )?;
        let classifier = Classifier::new(
            tensor(Parameter::HiddenLayerWeights)?,
            tensor(Parameter::HiddenLayerBiases)?,
            tensor(Parameter::SoftmaxLayerWeights)?,
            tensor(Parameter::SoftmaxLayerBiases)?,
        );

        Ok(Self {
            device,
            encoder: SequenceEncoder::new(arch),
            question,
            answer,
            classifier,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn arch(&self) -> &ArchConfig {
        self.encoder.arch()
    }

    pub fn question_branch(&self) -> &ConvBranch {
        &self.question
    }

    pub fn answer_branch(&self) -> &ConvBranch {
        &self.answer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn encode(
        &self,
        table: &EmbeddingTable,
        line: &str,
    ) -> Result<PaddedSequence, InferenceError> {
        self.encoder.encode(table, line, &self.device)
    }

    /// Question encoding, `(F_q)`.
    pub fn encode_question(
        &self,
        table: &EmbeddingTable,
        question: &str,
    ) -> Result<Tensor, InferenceError> {
        Ok(self.question.forward(&self.encode(table, question)?)?)
    }

    /// Answer encoding, `(F_a)`.
    pub fn encode_answer(
        &self,
        table: &EmbeddingTable,
        answer: &str,
    ) -> Result<Tensor, InferenceError> {
        Ok(self.answer.forward(&self.encode(table, answer)?)?)
    }

    /// Concatenated encodings, zero-padded to the hidden layer's input width.
    pub fn join(
        &self,
        table: &EmbeddingTable,
        question: &str,
        answer: &str,
    ) -> Result<Tensor, InferenceError> {
        let question = self.encode_question(table, question)?;
        let answer = self.encode_answer(table, answer)?;
        let joined = Tensor::cat(&[&question, &answer], 0)?;
        let padding = self
            .classifier
            .input_width()
            .saturating_sub(joined.dim(0)?);
        Ok(joined.pad_with_zeros(0, 0, padding)?)
    }

    pub fn score_pair(
        &self,
        table: &EmbeddingTable,
        question: &str,
        answer: &str,
    ) -> Result<PairScore, InferenceError> {
        let join = self.join(table, question, answer)?;
        let score = self.score_join(&join)?;
        debug!(
            logits = ?score.logits,
            match_log_prob = score.match_log_prob,
            "Scored pair"
        );
        Ok(score)
    }

    /// Runs the classifier on an already joined encoding.
    pub fn score_join(&self, join: &Tensor) -> Result<PairScore, InferenceError> {
        let logits = self.classifier.logits(join)?;
        let match_log_prob = match_log_probability(&logits)?;
        let values = logits.to_vec1::<f32>()?;
        Ok(PairScore {
            logits: [values[0], values[1]],
            match_log_prob,
        })
    }
}
