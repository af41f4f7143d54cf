//! Batch detection over a directory of flight logs.
//!
//! Each log is an independent unit of work: load, detect, export. Files
//! are processed in parallel, one file's failure never aborts the rest,
//! and the run ends with an aggregate summary rather than an error for
//! one bad input.

use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::detector::{detect_approaches, DetectionParams};
use crate::export::export_segments;
use crate::ingest::load_flight_csv;

/// Errors that abort a batch run before any file is processed.
///
/// Per-file failures never surface here — they are logged inline and
/// counted in the summary.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files that loaded and were scanned, whether or not they yielded segments
    pub files_processed: usize,
    /// Files that failed to load or export
    pub files_failed: usize,
    /// Total segments written
    pub segments_exported: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} approaches exported from {} files ({} failed)",
            self.segments_exported, self.files_processed, self.files_failed
        )
    }
}

/// CSV files directly inside `dir`, sorted by name.
fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory(dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Detect and export every approach in every log under `logs_dir`.
///
/// Parameters are validated once up front; after that each file is an
/// isolated, parallel task writing its own segment files into `out_dir`.
/// Segment file names derive from segment start times, so distinct
/// flights write distinct files; a collision (two segments starting the
/// same second) overwrites deterministically and is visible in the logs.
pub fn detect_and_export_dir(
    logs_dir: &Path,
    out_dir: &Path,
    params: &DetectionParams,
) -> Result<BatchSummary, BatchError> {
    params.validate()?;
    let files = csv_files(logs_dir)?;
    info!(dir = %logs_dir.display(), files = files.len(), "starting batch detection");

    let outcomes: Vec<Result<usize, ()>> = files
        .par_iter()
        .map(|file| {
            let process = || -> Result<usize, String> {
                let records = load_flight_csv(file).map_err(|e| e.to_string())?;
                let segments =
                    detect_approaches(&records, params).map_err(|e| e.to_string())?;
                let paths = export_segments(&segments, out_dir).map_err(|e| e.to_string())?;
                Ok(paths.len())
            };
            match process() {
                Ok(count) => {
                    info!(file = %file.display(), approaches = count, "processed");
                    Ok(count)
                }
                Err(error) => {
                    warn!(file = %file.display(), %error, "failed to process");
                    Err(())
                }
            }
        })
        .collect();

    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        match outcome {
            Ok(count) => {
                summary.files_processed += 1;
                summary.segments_exported += count;
            }
            Err(()) => summary.files_failed += 1,
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_log(dir: &Path, name: &str, n: usize) {
        // 1 Hz climb-cruise-descent profile ending at field elevation 0.
        let mut csv = String::from("Lcl Date, Lcl Time, AltMSL, AltGPS, VSpd, IAS\n");
        for i in 0..n {
            let alt = match i {
                i if i < 10 => (i as f64) * 20.0,
                i if i < n - 10 => 200.0,
                i => 200.0 - ((i - (n - 10)) as f64) * 20.0,
            };
            csv.push_str(&format!(
                "2024-03-11, 13:{:02}:{:02}, {alt}, {alt}, -300, 70\n",
                i / 60,
                i % 60
            ));
        }
        std::fs::write(dir.join(name), csv).expect("write log");
    }

    fn test_params() -> DetectionParams {
        DetectionParams {
            order: 2,
            min_climb_ft: 50.0,
            lookback_seconds: 30,
            field_elevation_ft: 0.0,
            elevation_tolerance_ft: 20.0,
            lead_seconds: 5,
        }
    }

    #[test]
    fn bad_file_is_counted_not_fatal() {
        let logs = tempfile::tempdir().expect("create logs dir");
        let out = tempfile::tempdir().expect("create out dir");
        write_log(logs.path(), "flight_a.csv", 60);
        std::fs::write(logs.path().join("broken.csv"), "no,header,here\n1,2,3\n")
            .expect("write broken file");

        let summary =
            detect_and_export_dir(logs.path(), out.path(), &test_params()).expect("should run");
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.segments_exported, 1);
    }

    #[test]
    fn non_csv_files_are_ignored() {
        let logs = tempfile::tempdir().expect("create logs dir");
        let out = tempfile::tempdir().expect("create out dir");
        write_log(logs.path(), "flight_a.csv", 60);
        std::fs::write(logs.path().join("readme.txt"), "not a log").expect("write txt");

        let summary =
            detect_and_export_dir(logs.path(), out.path(), &test_params()).expect("should run");
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_failed, 0);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let out = tempfile::tempdir().expect("create out dir");
        let missing = out.path().join("does-not-exist");
        assert!(matches!(
            detect_and_export_dir(&missing, out.path(), &test_params()),
            Err(BatchError::NotADirectory(_))
        ));
    }

    #[test]
    fn invalid_params_abort_before_scanning() {
        let logs = tempfile::tempdir().expect("create logs dir");
        let out = tempfile::tempdir().expect("create out dir");
        let mut params = test_params();
        params.order = 0;
        assert!(matches!(
            detect_and_export_dir(logs.path(), out.path(), &params),
            Err(BatchError::Config(_))
        ));
    }
}
