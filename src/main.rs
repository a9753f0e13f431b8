//! Coconut command-line entrypoint.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;

use coconut::config::Config;
use coconut::embedding::EmbeddingTable;
use coconut::model::{Backend, MatchModel, select_device};
use coconut::pipeline::{PairReader, Pipeline};
use coconut::weights::ParameterSet;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Score question/answer pairs with a convolutional matching network.
#[derive(Debug, Parser)]
#[command(name = "coconut", version)]
struct Cli {
    /// Weight file (record stream or `.safetensors`).
    #[arg(long, env = "COCONUT_WEIGHTS_PATH")]
    weights: Option<PathBuf>,

    /// Compute backend: auto, cpu, metal or cuda.
    #[arg(long)]
    device: Option<Backend>,

    /// Print one score per pair (default).
    #[arg(long, overrides_with = "no_scores")]
    scores: bool,

    /// Only print the run summary.
    #[arg(long, overrides_with = "scores")]
    no_scores: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Binary word embedding file.
    embeddings: PathBuf,

    /// Questions, one per line.
    questions: PathBuf,

    /// Answers, one per line, paired positionally with the questions.
    answers: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env()?
        .with_weights_path(cli.weights)
        .with_device(cli.device);
    config.validate()?;
    let arch = config.arch();

    tracing::info!(
        weights = ?config.weights_path,
        embed_dimension = arch.embed_dimension,
        column_padding = arch.column_padding,
        max_sentence_length = arch.max_sentence_length,
        device = %config.device,
        "Coconut starting"
    );

    let weights_path = config
        .weights_path
        .as_deref()
        .context("no weight file configured")?;
    let params = ParameterSet::open(weights_path, &arch)
        .with_context(|| format!("loading weights from {}", weights_path.display()))?;

    let device = select_device(config.device)?;
    let model = MatchModel::new(&params, arch, device)?;

    let table = EmbeddingTable::open(&cli.embeddings, arch.embed_dimension, config.unknown_seed)
        .with_context(|| format!("loading embeddings from {}", cli.embeddings.display()))?;

    let pairs = PairReader::open(&cli.questions, &cli.answers).with_context(|| {
        format!(
            "opening {} and {}",
            cli.questions.display(),
            cli.answers.display()
        )
    })?;

    let pipeline = Pipeline::new(&model, &table);
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let summary = if cli.no_scores {
        pipeline.run(pairs, |_, _| Ok(()))?
    } else {
        pipeline.run_to_writer(pairs, &mut out)?
    };

    if cli.json {
        writeln!(out, "{}", summary.to_json()?)?;
    } else {
        writeln!(out, "{summary}")?;
    }
    out.flush()?;

    Ok(())
}
