//! Core data types shared across the approach-analysis pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in defaults for detection, extraction, and dataset assembly.
///
/// Field elevation has no entry on purpose: there is no universal default,
/// it must come from the config file or the command line.
pub mod detection_defaults {
    /// Samples on each side that must be strictly higher for a local minimum
    pub const ORDER: usize = 150;
    /// Minimum altitude gain (ft) above the minimum to confirm a real descent
    pub const MIN_CLIMB_FT: f64 = 500.0;
    /// Time horizon (s) before the minimum within which the climb must be found
    pub const LOOKBACK_SECONDS: i64 = 180;
    /// Maximum deviation (ft) of a minimum from field elevation
    pub const ELEVATION_TOLERANCE_FT: f64 = 500.0;
    /// Exported segment duration (s) before the minimum
    pub const LEAD_SECONDS: i64 = 60;
    /// Trace length for feature extraction
    pub const N_POINTS: usize = 60;
    /// Train fraction for stratified splitting
    pub const SPLIT_RATIO: f64 = 0.8;
    /// Seed for the split shuffle
    pub const SPLIT_SEED: u64 = 69;
}

/// One sample of recorded flight state.
///
/// The loader guarantees a valid timestamp on every record it emits.
/// Any numeric channel may be absent for a given sample; consumers filter
/// for the channels they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Sample instant, timezone-naive, second resolution
    pub timestamp: NaiveDateTime,
    /// Barometric altitude (ft MSL) — the primary altitude channel
    pub alt_msl: Option<f64>,
    /// GPS altitude (ft)
    pub alt_gps: Option<f64>,
    /// Vertical speed (ft/min)
    pub vspd: Option<f64>,
    /// Indicated airspeed (kt)
    pub ias: Option<f64>,
}

/// One candidate landing approach detected in a flight series.
///
/// `end` is the instant of the detected altitude minimum; `start` is
/// `end` minus the configured lead time. `records` holds the sub-sequence
/// of the source series whose timestamps fall in `[start, end]`.
/// Segments are never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproachSegment {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub records: Vec<FlightRecord>,
}

impl ApproachSegment {
    /// Deterministic export file name derived from the segment start.
    pub fn export_file_name(&self) -> String {
        format!("approach_{}.csv", self.start.format("%Y%m%d_%H%M%S"))
    }

    /// Segment duration in seconds.
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Disposition of a reviewed approach segment.
///
/// Only `Good` and `Bad` enter the training dataset; the rest are
/// transient review states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Good,
    Bad,
    Anomaly,
    Skipped,
    Unclassified,
}

impl Label {
    /// Labels that participate in training datasets, in class-index order.
    pub const TRAINING: [Self; 2] = [Self::Good, Self::Bad];

    /// All bucket labels, including transient review states.
    pub const ALL: [Self; 5] = [
        Self::Good,
        Self::Bad,
        Self::Anomaly,
        Self::Skipped,
        Self::Unclassified,
    ];

    /// Directory name of this label's corpus bucket.
    pub fn bucket_name(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
            Self::Anomaly => "anomalies",
            Self::Skipped => "skipped",
            Self::Unclassified => "unclassified",
        }
    }

    /// Numeric class index for the classifier hand-off (good = 0, bad = 1).
    /// Transient labels have no class index.
    pub fn class_index(self) -> Option<u8> {
        match self {
            Self::Good => Some(0),
            Self::Bad => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bucket_name())
    }
}

/// Rectangular feature matrix plus a parallel label vector.
///
/// This is the entire contract with the classification component: rows are
/// samples, columns are fixed feature positions
/// (`[alt_0..alt_{n-1}, rate_0..rate_{n-1}, (accel_0..accel_{n-1})]`),
/// and `labels[i]` is the class index of `rows[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Row-major feature rows, each of length `row_len`
    pub rows: Vec<Vec<f64>>,
    /// Class index per row (good = 0, bad = 1)
    pub labels: Vec<u8>,
    /// Fixed row length (`n_points × {2,3}`)
    pub row_len: usize,
}

impl FeatureMatrix {
    /// Create an empty matrix with a fixed row length.
    pub fn new(row_len: usize) -> Self {
        Self {
            rows: Vec::new(),
            labels: Vec::new(),
            row_len,
        }
    }

    /// Number of samples in the matrix.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix holds no samples.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row with its class index.
    ///
    /// Returns false (and leaves the matrix unchanged) if the row length
    /// does not match — the matrix stays rectangular by construction.
    pub fn push_row(&mut self, row: Vec<f64>, class_index: u8) -> bool {
        if row.len() != self.row_len {
            return false;
        }
        self.rows.push(row);
        self.labels.push(class_index);
        true
    }

    /// Count of samples carrying the given class index.
    pub fn class_count(&self, class_index: u8) -> usize {
        self.labels.iter().filter(|&&l| l == class_index).count()
    }
}
