//! Stratified train/test split over a labeled approach corpus.
//!
//! Copies the corpus's `good` and `bad` segment files into
//! `train/{good,bad}` and `test/{good,bad}` using a seeded shuffle, so
//! the same seed always produces the same split. Optionally writes the
//! full corpus's feature matrix as JSON for an external trainer.
//!
//! Usage:
//!   cargo run --bin split-dataset -- manual_classification
//!   cargo run --bin split-dataset -- manual_classification --matrix features.json

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use glidepath::{
    assemble_feature_matrix, stratified_split, GlidepathConfig, Label, LabeledCorpus,
};

/// Deterministic dataset splitting for labeled approach corpora.
#[derive(Parser, Debug)]
#[command(name = "split-dataset")]
#[command(about = "Stratified train/test split over a labeled approach corpus")]
#[command(version)]
struct Args {
    /// Corpus root containing the good/ and bad/ buckets
    corpus_root: PathBuf,

    /// Output directory for the training partition
    #[arg(long, default_value = "train")]
    train_dir: PathBuf,

    /// Output directory for the test partition
    #[arg(long, default_value = "test")]
    test_dir: PathBuf,

    /// Train fraction; overrides the config file
    #[arg(long)]
    ratio: Option<f64>,

    /// Shuffle seed; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the corpus feature matrix as JSON to this path
    #[arg(long, value_name = "PATH")]
    matrix: Option<PathBuf>,

    /// Path to a specific config file (otherwise the standard search
    /// order applies)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn copy_into(files: &[(Label, PathBuf)], base: &Path) -> Result<()> {
    for (label, file) in files {
        let dir = base.join(label.bucket_name());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        let name = file
            .file_name()
            .with_context(|| format!("{} has no file name", file.display()))?;
        std::fs::copy(file, dir.join(name))
            .with_context(|| format!("copying {}", file.display()))?;
    }
    Ok(())
}

fn count(files: &[(Label, PathBuf)], label: Label) -> usize {
    files.iter().filter(|(l, _)| *l == label).count()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GlidepathConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GlidepathConfig::load(),
    };
    let ratio = args.ratio.unwrap_or(config.split.ratio);
    let seed = args.seed.unwrap_or(config.split.seed);

    let corpus = LabeledCorpus::new(&args.corpus_root);
    let by_class = corpus
        .training_files()
        .with_context(|| format!("scanning corpus at {}", args.corpus_root.display()))?;

    let split = stratified_split(by_class, ratio, seed).context("splitting corpus")?;
    copy_into(&split.train, &args.train_dir)?;
    copy_into(&split.test, &args.test_dir)?;

    println!("split complete (ratio {ratio}, seed {seed}):");
    println!(
        "  train -> {} good, {} bad",
        count(&split.train, Label::Good),
        count(&split.train, Label::Bad)
    );
    println!(
        "  test  -> {} good, {} bad",
        count(&split.test, Label::Good),
        count(&split.test, Label::Bad)
    );

    if let Some(matrix_path) = &args.matrix {
        let params = config.feature_params().context("building feature parameters")?;
        let assembly =
            assemble_feature_matrix(&corpus, &params).context("assembling feature matrix")?;
        let file = std::fs::File::create(matrix_path)
            .with_context(|| format!("creating {}", matrix_path.display()))?;
        serde_json::to_writer_pretty(file, &assembly.matrix)
            .context("serializing feature matrix")?;
        println!(
            "  matrix -> {} rows x {} features ({} short, {} unreadable) at '{}'",
            assembly.matrix.len(),
            assembly.matrix.row_len,
            assembly.skipped_short,
            assembly.failed_files,
            matrix_path.display()
        );
    }
    Ok(())
}
