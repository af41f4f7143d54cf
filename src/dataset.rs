//! Labeled corpus layout and dataset assembly.
//!
//! A labeled corpus is a partition of exported segment files into bucket
//! directories (`good`, `bad`, plus the transient review buckets); bucket
//! membership *is* the label. This module scans buckets, produces
//! deterministic stratified train/test splits, and assembles the feature
//! matrix handed to the classifier.
//!
//! The split routine knows nothing about feature extraction: it shuffles
//! and partitions whatever opaque unit of labeled data the caller
//! supplies.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::ConfigError;
use crate::features::{extract_features, FeatureParams};
use crate::ingest::load_flight_csv;
use crate::types::{FeatureMatrix, Label};

// ============================================================================
// Corpus Layout
// ============================================================================

/// A labeled corpus rooted at one directory, one sub-directory per bucket.
#[derive(Debug, Clone)]
pub struct LabeledCorpus {
    root: PathBuf,
}

impl LabeledCorpus {
    /// Wrap an existing (or about-to-exist) corpus root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Corpus root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one label's bucket.
    pub fn bucket_dir(&self, label: Label) -> PathBuf {
        self.root.join(label.bucket_name())
    }

    /// Create every bucket directory that does not exist yet.
    pub fn ensure_buckets(&self) -> std::io::Result<()> {
        for label in Label::ALL {
            std::fs::create_dir_all(self.bucket_dir(label))?;
        }
        Ok(())
    }

    /// CSV files in one bucket, sorted by file name for deterministic
    /// ordering. A missing bucket directory reads as empty.
    pub fn files_in(&self, label: Label) -> std::io::Result<Vec<PathBuf>> {
        let dir = self.bucket_dir(label);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
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

    /// Files of every training bucket, keyed by label.
    pub fn training_files(&self) -> std::io::Result<BTreeMap<Label, Vec<PathBuf>>> {
        let mut by_class = BTreeMap::new();
        for label in Label::TRAINING {
            by_class.insert(label, self.files_in(label)?);
        }
        Ok(by_class)
    }
}

// ============================================================================
// Stratified Split
// ============================================================================

/// Result of a stratified split over opaque labeled units.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit<T> {
    pub train: Vec<(Label, T)>,
    pub test: Vec<(Label, T)>,
}

/// Stratified, seeded train/test split.
///
/// Each class's items are shuffled independently (one RNG seeded from
/// `seed`, classes processed in stable label order), then the first
/// `⌊len × ratio⌋` of each class go to train and the remainder to test.
/// Identical seed and input always yield identical partitions. Class
/// proportions are approximate — integer truncation, by design.
pub fn stratified_split<T>(
    by_class: BTreeMap<Label, Vec<T>>,
    ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit<T>, ConfigError> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(ConfigError::InvalidParameter(format!(
            "split ratio must be inside (0, 1), got {ratio}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (label, mut items) in by_class {
        items.shuffle(&mut rng);
        let cut = (items.len() as f64 * ratio) as usize;
        for (i, item) in items.into_iter().enumerate() {
            if i < cut {
                train.push((label, item));
            } else {
                test.push((label, item));
            }
        }
    }
    Ok(TrainTestSplit { train, test })
}

// ============================================================================
// Feature Matrix Assembly
// ============================================================================

/// Outcome of assembling a feature matrix from a corpus.
///
/// Files that are too short for the configured trace length are an
/// expected condition and only counted; malformed files are counted and
/// reported inline without aborting the rest.
#[derive(Debug)]
pub struct MatrixAssembly {
    pub matrix: FeatureMatrix,
    /// Labeled files skipped for having fewer than `n_points` valid samples
    pub skipped_short: usize,
    /// Labeled files that failed to load
    pub failed_files: usize,
}

/// Build the classifier hand-off matrix from the corpus's `good` and
/// `bad` buckets.
pub fn assemble_feature_matrix(
    corpus: &LabeledCorpus,
    params: &FeatureParams,
) -> Result<MatrixAssembly, ConfigError> {
    params.validate()?;

    let mut matrix = FeatureMatrix::new(params.vector_len());
    let mut skipped_short = 0usize;
    let mut failed_files = 0usize;

    for label in Label::TRAINING {
        let class_index = match label.class_index() {
            Some(idx) => idx,
            None => continue,
        };
        let files = corpus.files_in(label).map_err(ConfigError::Io)?;
        for file in files {
            let records = match load_flight_csv(&file) {
                Ok(records) => records,
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping unreadable labeled file");
                    failed_files += 1;
                    continue;
                }
            };
            match extract_features(&records, params)? {
                Some(row) => {
                    matrix.push_row(row, class_index);
                }
                None => skipped_short += 1,
            }
        }
    }

    Ok(MatrixAssembly {
        matrix,
        skipped_short,
        failed_files,
    })
}
