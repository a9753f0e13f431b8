//! On-disk fixtures for integration tests.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use candle_core::Device;
use coconut::constants::ArchConfig;
use coconut::weights::{PARAMETER_NAMES, RecordWriter, TensorRecord};

pub const EMBED_DIMENSION: usize = 2;

pub const COLUMN_PADDING: usize = 1;

pub const MAX_SENTENCE_LENGTH: usize = 4;

pub const SEED: u64 = 1234;

pub fn arch() -> ArchConfig {
    ArchConfig::new(EMBED_DIMENSION, COLUMN_PADDING, MAX_SENTENCE_LENGTH)
}

/// One 1-wide filter per branch reading embedding row 0, identity hidden
/// layer, and a match logit that sums both hidden units.
pub fn reference_records() -> Vec<TensorRecord> {
    vec![
        TensorRecord::new(vec![1, 2, 1], vec![1.0, 0.0]),
        TensorRecord::new(vec![1], vec![0.0]),
        TensorRecord::new(vec![1, 2, 1], vec![1.0, 0.0]),
        TensorRecord::new(vec![1], vec![0.0]),
        TensorRecord::new(vec![2, 2], vec![1.0, 0.0, 0.0, 1.0]),
        TensorRecord::new(vec![2], vec![0.0, 0.0]),
        TensorRecord::new(vec![2, 2], vec![0.0, 0.0, 1.0, 1.0]),
        TensorRecord::new(vec![2], vec![0.0, 0.0]),
    ]
}

/// Match log-probability of a pair whose question and answer both contain "cat".
pub fn expected_cat_score() -> f32 {
    let h = 2.0 * 1.0f32.tanh().tanh();
    let match_logit = 2.0 * h;
    -(1.0 + (-match_logit).exp()).ln()
}

/// Match log-probability of a pair with no "cat" on either side.
pub fn expected_no_cat_score() -> f32 {
    -(2.0f32).ln()
}

pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir should be created"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_text(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("text fixture should be written");
        path
    }

    /// `cat = [1, 0]`, `sat = [0, 1]`.
    pub fn write_embeddings(&self, name: &str) -> PathBuf {
        let entries: [(&str, [f32; 2]); 2] = [("cat", [1.0, 0.0]), ("sat", [0.0, 1.0])];

        let mut bytes = format!("{} {}\n", entries.len(), EMBED_DIMENSION).into_bytes();
        for (word, vector) in entries {
            bytes.extend_from_slice(word.as_bytes());
            bytes.push(b' ');
            for value in vector {
                bytes.extend_from_slice(&value.to_ne_bytes());
            }
            bytes.push(b'\n');
        }

        let path = self.path(name);
        std::fs::write(&path, bytes).expect("embedding fixture should be written");
        path
    }

    pub fn write_record_stream(&self, name: &str, records: &[TensorRecord]) -> PathBuf {
        let path = self.path(name);
        write_record_stream(&path, records);
        path
    }

    pub fn write_safetensors(&self, name: &str, records: &[TensorRecord]) -> PathBuf {
        let tensors: HashMap<String, candle_core::Tensor> = PARAMETER_NAMES
            .iter()
            .zip(records)
            .map(|(name, record)| {
                let tensor = record
                    .to_tensor(&Device::Cpu)
                    .expect("record should convert to a tensor");
                (name.to_string(), tensor)
            })
            .collect();

        let path = self.path(name);
        candle_core::safetensors::save(&tensors, &path).expect("safetensors should be written");
        path
    }
}

fn write_record_stream(path: &Path, records: &[TensorRecord]) {
    let file = File::create(path).expect("weight file should be created");
    let mut writer = RecordWriter::new(BufWriter::new(file)).expect("header should be written");
    for record in records {
        writer.write_record(record).expect("record should be written");
    }
    writer.finish().expect("stream should flush");
}
