//! Detect and export landing approaches from a directory of flight logs.
//!
//! Usage:
//!   cargo run --bin detect-approaches -- logs/ --field-elevation 5045
//!   cargo run --bin detect-approaches -- logs/ --output corpus/unclassified
//!
//! Detection parameters come from `glidepath.toml` (or the file named by
//! `GLIDEPATH_CONFIG`); `--field-elevation` overrides the config value.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use glidepath::{detect_and_export_dir, GlidepathConfig};

/// Batch approach detection over flight-data-recorder logs.
#[derive(Parser, Debug)]
#[command(name = "detect-approaches")]
#[command(about = "Detect and export landing approaches from a directory of flight logs")]
#[command(version)]
struct Args {
    /// Directory containing raw flight log CSVs
    logs_dir: PathBuf,

    /// Output directory for exported approach segments
    #[arg(short, long, default_value = "approaches_export")]
    output: PathBuf,

    /// Field elevation (ft MSL) at the expected landing site;
    /// overrides the config file
    #[arg(long, value_name = "FT")]
    field_elevation: Option<f64>,

    /// Path to a specific config file (otherwise the standard search
    /// order applies)
    #[arg(long)]
    config: Option<PathBuf>,
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
    let params = config
        .detection_params(args.field_elevation)
        .context("building detection parameters")?;

    let summary = detect_and_export_dir(&args.logs_dir, &args.output, &params)
        .with_context(|| format!("processing logs in {}", args.logs_dir.display()))?;

    println!("{summary}");
    println!("segments written to '{}'", args.output.display());
    Ok(())
}
