//! Manual review loop over exported approach segments.
//!
//! Walks the corpus's `unclassified` bucket, prints a short profile of
//! each segment, and waits for a disposition on stdin:
//!
//!   g = good    b = bad    a = anomaly    s = skip
//!   u = undo previous      q = quit
//!
//! Classifying moves the segment file into the matching bucket; `u`
//! moves the previous file back and re-presents it. Only the
//! immediately preceding item can be undone.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use glidepath::{
    load_flight_csv, next_action, FlightRecord, Label, LabeledCorpus, ReviewAction, ReviewSession,
};

/// Interactive labeling of exported approach segments.
#[derive(Parser, Debug)]
#[command(name = "review-approaches")]
#[command(about = "Manual review loop over exported approach segments")]
#[command(version)]
struct Args {
    /// Corpus root containing the bucket directories
    /// (unclassified/good/bad/anomalies/skipped)
    #[arg(default_value = "manual_classification")]
    corpus_root: PathBuf,
}

/// Print a compact profile of the segment so the reviewer can judge it
/// without a plot.
fn print_profile(records: &[FlightRecord]) {
    let gps: Vec<f64> = records.iter().filter_map(|r| r.alt_gps).collect();
    let alts = if gps.is_empty() {
        records.iter().filter_map(|r| r.alt_msl).collect()
    } else {
        gps
    };
    let vspd: Vec<f64> = records.iter().filter_map(|r| r.vspd).collect();

    if let (Some(first), Some(last)) = (records.first(), records.last()) {
        let duration = (last.timestamp - first.timestamp).num_seconds();
        println!("  window:    {} .. {} ({duration} s)", first.timestamp, last.timestamp);
    }
    if let (Some(&first), Some(&last)) = (alts.first(), alts.last()) {
        println!("  altitude:  {first:.0} ft -> {last:.0} ft ({:+.0} ft)", last - first);
    }
    if !vspd.is_empty() {
        let min = vspd.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = vspd.iter().sum::<f64>() / vspd.len() as f64;
        println!("  vspd:      mean {mean:.0} ft/min, peak {min:.0} ft/min");
    }
}

fn run(session: &mut ReviewSession, input: &mut impl BufRead) -> Result<()> {
    while !session.is_done() {
        let (position, total) = session.progress();
        let Some(item) = session.current() else { break };
        let name = item
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string();

        println!("\n[{position}/{total}] {name}");
        match load_flight_csv(&item.path) {
            Ok(records) => print_profile(&records),
            Err(e) => warn!(file = %name, error = %e, "could not parse segment"),
        }
        println!("  [g]ood  [b]ad  [a]nomaly  [s]kip  [u]ndo previous  [q]uit");

        match next_action(input)? {
            None | Some(ReviewAction::Quit) => break,
            Some(ReviewAction::Back) => {
                if !session.back().context("undoing previous item")? {
                    println!("nothing to undo");
                }
            }
            Some(action) => {
                if let Some(label) = action.label() {
                    session
                        .classify(label)
                        .with_context(|| format!("classifying {name}"))?;
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let corpus = LabeledCorpus::new(&args.corpus_root);
    let mut session = ReviewSession::open(corpus)
        .with_context(|| format!("opening corpus at {}", args.corpus_root.display()))?;

    let (_, total) = session.progress();
    if total == 0 {
        println!(
            "no unclassified segments in '{}'",
            args.corpus_root.display()
        );
        return Ok(());
    }

    let stdin = std::io::stdin();
    run(&mut session, &mut stdin.lock())?;

    println!(
        "\nreviewed: {} good, {} bad, {} anomalies, {} skipped",
        session.count_labeled(Label::Good),
        session.count_labeled(Label::Bad),
        session.count_labeled(Label::Anomaly),
        session.count_labeled(Label::Skipped),
    );
    Ok(())
}
