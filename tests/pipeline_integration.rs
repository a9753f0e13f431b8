//! File-to-score tests over real weight, embedding, and sentence files.

mod common;

use std::path::Path;
use std::process::Command;

use candle_core::Device;
use coconut::embedding::EmbeddingTable;
use coconut::model::MatchModel;
use coconut::pipeline::{PairReader, Pipeline, RunSummary};
use coconut::weights::{ParameterSet, TensorRecord, WeightError};

use common::fixtures::{
    COLUMN_PADDING, EMBED_DIMENSION, MAX_SENTENCE_LENGTH, SEED, Workspace, arch,
    expected_cat_score, expected_no_cat_score, reference_records,
};

const EPS: f32 = 1e-5;

fn run(
    workspace: &Workspace,
    weights: &Path,
    questions: &str,
    answers: &str,
) -> (Vec<String>, RunSummary) {
    let params = ParameterSet::open(weights, &arch()).expect("weights should load");
    let model = MatchModel::new(&params, arch(), Device::Cpu).expect("model should build");
    let vectors = workspace.write_embeddings("vectors.bin");
    let table =
        EmbeddingTable::open(&vectors, EMBED_DIMENSION, SEED).expect("embeddings should load");

    let pairs = PairReader::open(
        workspace.write_text("questions.txt", questions),
        workspace.write_text("answers.txt", answers),
    )
    .expect("sentence files should open");

    let mut out = Vec::new();
    let summary = Pipeline::new(&model, &table)
        .run_to_writer(pairs, &mut out)
        .expect("run should succeed");

    let lines = String::from_utf8(out)
        .expect("output should be utf-8")
        .lines()
        .map(str::to_string)
        .collect();
    (lines, summary)
}

fn parse_score(line: &str) -> f32 {
    line.parse().expect("score line should parse")
}

#[test]
fn test_record_stream_end_to_end() {
    let workspace = Workspace::new();
    let weights = workspace.write_record_stream("weights.cnnw", &reference_records());

    let (lines, summary) = run(&workspace, &weights, "cat sat\nsat\n", "cat\nsat sat\n");

    assert_eq!(summary.pairs, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(lines.len(), 2);
    assert!((parse_score(&lines[0]) - expected_cat_score()).abs() < EPS);
    assert!((parse_score(&lines[1]) - expected_no_cat_score()).abs() < EPS);
}

#[test]
fn test_safetensors_matches_record_stream() {
    let workspace = Workspace::new();
    let stream = workspace.write_record_stream("weights.cnnw", &reference_records());
    let safetensors = workspace.write_safetensors("weights.safetensors", &reference_records());

    let (from_stream, _) = run(&workspace, &stream, "cat sat\nsat\n", "cat\nsat\n");
    let (from_safetensors, _) = run(&workspace, &safetensors, "cat sat\nsat\n", "cat\nsat\n");
    assert_eq!(from_stream, from_safetensors);
}

#[test]
fn test_pair_count_stops_at_shorter_file_or_blank_line() {
    let workspace = Workspace::new();
    let weights = workspace.write_record_stream("weights.cnnw", &reference_records());

    let (lines, summary) = run(&workspace, &weights, "cat\nsat\ncat\n", "sat\ncat\n");
    assert_eq!(summary.pairs, 2);
    assert_eq!(lines.len(), 2);

    let (lines, summary) = run(&workspace, &weights, "cat\nsat\n\ncat\n", "sat\ncat\ncat\ncat\n");
    assert_eq!(summary.pairs, 2);
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_over_long_sentence_is_skipped() {
    let workspace = Workspace::new();
    let weights = workspace.write_record_stream("weights.cnnw", &reference_records());

    let too_long = vec!["cat"; MAX_SENTENCE_LENGTH + 1].join(" ");
    let questions = format!("cat\n{too_long}\nsat\n");

    let (lines, summary) = run(&workspace, &weights, &questions, "cat\ncat\ncat\n");
    assert_eq!(summary.pairs, 3);
    assert_eq!(summary.scored, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(lines[1], "skipped");
}

#[test]
fn test_short_weight_stream_is_rejected() {
    let workspace = Workspace::new();
    let records: Vec<TensorRecord> = reference_records().into_iter().take(7).collect();
    let weights = workspace.write_record_stream("weights.cnnw", &records);

    let result = ParameterSet::open(&weights, &arch());
    assert!(matches!(result, Err(WeightError::SchemaMismatch { .. })));
}

#[test]
fn test_binary_prints_scores_and_summary() {
    let workspace = Workspace::new();
    let weights = workspace.write_record_stream("weights.cnnw", &reference_records());
    let embeddings = workspace.write_embeddings("vectors.bin");
    let questions = workspace.write_text("questions.txt", "cat sat\nsat\n");
    let answers = workspace.write_text("answers.txt", "cat\nsat\n");

    let output = Command::new(env!("CARGO_BIN_EXE_coconut"))
        .env_remove("COCONUT_WEIGHTS_PATH")
        .env_remove("COCONUT_UNKNOWN_SEED")
        .env_remove("RUST_LOG")
        .env_remove("COCONUT_DEVICE")
        .env("COCONUT_EMBED_DIMENSION", EMBED_DIMENSION.to_string())
        .env("COCONUT_COLUMN_PADDING", COLUMN_PADDING.to_string())
        .env("COCONUT_MAX_SENTENCE_LENGTH", MAX_SENTENCE_LENGTH.to_string())
        .arg("--weights")
        .arg(&weights)
        .arg("--json")
        .arg("--device")
        .arg("cpu")
        .arg(&embeddings)
        .arg(&questions)
        .arg(&answers)
        .output()
        .expect("binary should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!((parse_score(lines[0]) - expected_cat_score()).abs() < EPS);
    assert!((parse_score(lines[1]) - expected_no_cat_score()).abs() < EPS);

    let summary: serde_json::Value = serde_json::from_str(lines[2]).expect("summary should be json");
    assert_eq!(summary["pairs"], 2);
    assert_eq!(summary["skipped"], 0);
}

#[test]
fn test_binary_without_weights_fails() {
    let workspace = Workspace::new();
    let embeddings = workspace.write_embeddings("vectors.bin");
    let questions = workspace.write_text("questions.txt", "cat\n");
    let answers = workspace.write_text("answers.txt", "cat\n");

    let output = Command::new(env!("CARGO_BIN_EXE_coconut"))
        .env_remove("COCONUT_WEIGHTS_PATH")
        .env("COCONUT_EMBED_DIMENSION", EMBED_DIMENSION.to_string())
        .arg(&embeddings)
        .arg(&questions)
        .arg(&answers)
        .output()
        .expect("binary should run");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("COCONUT_WEIGHTS_PATH"));
}

#[test]
fn test_binary_rejects_unknown_device() {
    let workspace = Workspace::new();
    let weights = workspace.write_record_stream("weights.cnnw", &reference_records());
    let embeddings = workspace.write_embeddings("vectors.bin");
    let questions = workspace.write_text("questions.txt", "cat\n");
    let answers = workspace.write_text("answers.txt", "cat\n");

    let output = Command::new(env!("CARGO_BIN_EXE_coconut"))
        .env_remove("COCONUT_WEIGHTS_PATH")
        .env("COCONUT_DEVICE", "tpu")
        .env("COCONUT_EMBED_DIMENSION", EMBED_DIMENSION.to_string())
        .arg("--weights")
        .arg(&weights)
        .arg(&embeddings)
        .arg(&questions)
        .arg(&answers)
        .output()
        .expect("binary should run");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("tpu"));
}
