//! Glidepath: landing-approach extraction and classification support
//! for flight-data-recorder logs.
//!
//! ## Pipeline
//!
//! - **Ingest**: parse logger CSVs (three auto-detected layouts) into
//!   timestamped record series
//! - **Detector**: find descent-to-landing events in the altitude series,
//!   rejecting transient dips far from the field or without a prior climb
//! - **Export**: write each approach segment as its own CSV
//! - **Review**: keyboard-driven labeling loop that sorts segments into
//!   corpus buckets (`good`, `bad`, `anomalies`, `skipped`)
//! - **Features / Dataset**: fixed-length altitude and altitude-rate
//!   traces per segment, assembled into a feature matrix with a
//!   deterministic stratified train/test split
//!
//! Classification itself is out of scope: the hand-off is a rectangular
//! feature matrix plus a parallel label vector.

pub mod batch;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod export;
pub mod features;
pub mod ingest;
pub mod review;
pub mod types;

// Re-export the core types and operations
pub use batch::{detect_and_export_dir, BatchError, BatchSummary};
pub use config::{ConfigError, GlidepathConfig};
pub use dataset::{
    assemble_feature_matrix, stratified_split, LabeledCorpus, MatrixAssembly, TrainTestSplit,
};
pub use detector::{detect_approaches, DetectionParams};
pub use export::{export_segment, export_segments, ExportError};
pub use features::{extract_features, AltitudeSource, FeatureParams};
pub use ingest::{load_flight_csv, IngestError};
pub use review::{next_action, ReviewAction, ReviewError, ReviewItem, ReviewSession};
pub use types::{ApproachSegment, FeatureMatrix, FlightRecord, Label};
