use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info};

use crate::constants::{ArchConfig, OUTPUT_CLASSES};

use super::error::{WeightError, WeightResult};
use super::record::{RecordReader, TensorRecord, TensorStream};
use super::safetensors::SafetensorsStream;

/// Parameter names in stream order.
pub const PARAMETER_NAMES: [&str; 8] = [
    "question_convolution_filters",
    "question_convolution_biases",
    "answer_convolution_filters",
    "answer_convolution_biases",
    "hidden_layer_weights",
    "hidden_layer_biases",
    "softmax_layer_weights",
    "softmax_layer_biases",
];

/// One slot of the parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    QuestionConvolutionFilters,
    QuestionConvolutionBiases,
    AnswerConvolutionFilters,
    AnswerConvolutionBiases,
    HiddenLayerWeights,
    HiddenLayerBiases,
    SoftmaxLayerWeights,
    SoftmaxLayerBiases,
}

impl Parameter {
    pub const ALL: [Parameter; 8] = [
        Parameter::QuestionConvolutionFilters,
        Parameter::QuestionConvolutionBiases,
        Parameter::AnswerConvolutionFilters,
        Parameter::AnswerConvolutionBiases,
        Parameter::HiddenLayerWeights,
        Parameter::HiddenLayerBiases,
        Parameter::SoftmaxLayerWeights,
        Parameter::SoftmaxLayerBiases,
    ];

    pub fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        PARAMETER_NAMES[self.slot()]
    }

    pub fn rank(self) -> usize {
        match self {
            Parameter::QuestionConvolutionFilters | Parameter::AnswerConvolutionFilters => 3,
            Parameter::HiddenLayerWeights | Parameter::SoftmaxLayerWeights => 2,
            _ => 1,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The eight weight tensors of the network, validated against the architecture.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    records: Vec<TensorRecord>,
}

impl ParameterSet {
    /// Opens a weight file: `.safetensors` by extension, otherwise a record stream.
    pub fn open<P: AsRef<Path>>(path: P, arch: &ArchConfig) -> WeightResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WeightError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let is_safetensors = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));

        info!(path = %path.display(), safetensors = is_safetensors, "Loading network weights");

        if is_safetensors {
            Self::from_stream(SafetensorsStream::open(path)?, arch)
        } else {
            let reader = RecordReader::new(BufReader::new(File::open(path)?))?;
            Self::from_stream(reader, arch)
        }
    }

    /// Pulls every record from `stream` and binds it to a slot.
    ///
    /// Named records bind by name, unnamed records by stream position.
    pub fn from_stream<S: TensorStream>(mut stream: S, arch: &ArchConfig) -> WeightResult<Self> {
        let mut slots: [Option<TensorRecord>; 8] = Default::default();
        let mut index = 0usize;

        while let Some(record) = stream.next_record()? {
            record.validate()?;

            let parameter = match record.name.as_deref() {
                Some(name) => Parameter::from_name(name).ok_or_else(|| {
                    WeightError::schema(format!("record {index} has unknown name '{name}'"))
                })?,
                None => Parameter::ALL.get(index).copied().ok_or_else(|| {
                    WeightError::schema(format!(
                        "stream has more than {} records",
                        Parameter::ALL.len()
                    ))
                })?,
            };

            if record.rank() != parameter.rank() {
                return Err(WeightError::schema(format!(
                    "{parameter} must have rank {}, record {index} has rank {} (dims {:?})",
                    parameter.rank(),
                    record.rank(),
                    record.dims
                )));
            }

            let slot = &mut slots[parameter.slot()];
            if slot.is_some() {
                return Err(WeightError::schema(format!(
                    "{parameter} bound twice (record {index})"
                )));
            }

            debug!(parameter = %parameter, dims = ?record.dims, "Bound weight tensor");
            *slot = Some(record);
            index += 1;
        }

        let missing: Vec<&str> = Parameter::ALL
            .iter()
            .filter(|p| slots[p.slot()].is_none())
            .map(|p| p.name())
            .collect();
        if !missing.is_empty() {
            return Err(WeightError::schema(format!(
                "stream ended after {index} records; missing {}",
                missing.join(", ")
            )));
        }

        let records = slots.into_iter().flatten().collect();
        let set = Self { records };
        set.validate_shapes(arch)?;

        info!(
            question_filters = set.filter_count(Parameter::QuestionConvolutionFilters),
            answer_filters = set.filter_count(Parameter::AnswerConvolutionFilters),
            hidden_units = set.hidden_units(),
            "Network weights loaded"
        );

        Ok(set)
    }

    pub fn get(&self, parameter: Parameter) -> &TensorRecord {
        &self.records[parameter.slot()]
    }

    /// Leading dimension of a tensor (filter count for rank-3 filters).
    pub fn filter_count(&self, parameter: Parameter) -> usize {
        self.get(parameter).dims[0]
    }

    /// Width of the joined encoding the hidden layer consumes.
    pub fn join_width(&self) -> usize {
        self.get(Parameter::HiddenLayerWeights).dims[0]
    }

    pub fn hidden_units(&self) -> usize {
        self.get(Parameter::HiddenLayerWeights).dims[1]
    }

    fn validate_shapes(&self, arch: &ArchConfig) -> WeightResult<()> {
        let mut joined = 0;
        for (filters, biases) in [
            (
                Parameter::QuestionConvolutionFilters,
                Parameter::QuestionConvolutionBiases,
            ),
            (
                Parameter::AnswerConvolutionFilters,
                Parameter::AnswerConvolutionBiases,
            ),
        ] {
            let dims = &self.get(filters).dims;
            let (count, depth, width) = (dims[0], dims[1], dims[2]);

            if count == 0 {
                return Err(WeightError::schema(format!("{filters} has no filters")));
            }
            if depth != arch.embed_dimension {
                return Err(WeightError::schema(format!(
                    "{filters} depth {depth} does not match embedding dimension {}",
                    arch.embed_dimension
                )));
            }
            if width == 0 || width > arch.max_window_width() {
                return Err(WeightError::schema(format!(
                    "{filters} window width {width} must be within 1..={} for column padding {}",
                    arch.max_window_width(),
                    arch.column_padding
                )));
            }
            expect_len(self.get(biases), biases, count)?;
            joined += count;
        }

        // The join is zero-padded up to the hidden layer's input width.
        let hidden = &self.get(Parameter::HiddenLayerWeights).dims;
        if hidden[0] < joined {
            return Err(WeightError::schema(format!(
                "{} takes {} inputs but the branches produce {joined}",
                Parameter::HiddenLayerWeights,
                hidden[0]
            )));
        }
        let units = hidden[1];
        expect_len(
            self.get(Parameter::HiddenLayerBiases),
            Parameter::HiddenLayerBiases,
            units,
        )?;

        let softmax = &self.get(Parameter::SoftmaxLayerWeights).dims;
        if softmax[0] != OUTPUT_CLASSES || softmax[1] != units {
            return Err(WeightError::schema(format!(
                "{} has dims {softmax:?}, expected [{OUTPUT_CLASSES}, {units}]",
                Parameter::SoftmaxLayerWeights
            )));
        }
        expect_len(
            self.get(Parameter::SoftmaxLayerBiases),
            Parameter::SoftmaxLayerBiases,
            OUTPUT_CLASSES,
        )?;

        Ok(())
    }
}

fn expect_len(record: &TensorRecord, parameter: Parameter, len: usize) -> WeightResult<()> {
    if record.dims[0] != len {
        return Err(WeightError::schema(format!(
            "{parameter} has length {}, expected {len}",
            record.dims[0]
        )));
    }
    Ok(())
}
