//! End-to-end corpus round trip: detect → export → review → split →
//! feature matrix, all against a temporary directory tree.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use glidepath::{
    assemble_feature_matrix, detect_approaches, export_segments, load_flight_csv,
    stratified_split, DetectionParams, FeatureParams, FlightRecord, Label, LabeledCorpus,
    ReviewSession,
};
use std::path::Path;

fn timestamp(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 11)
        .expect("valid date")
        .and_hms_opt(13, minute, 0)
        .expect("valid time")
}

/// Climb-cruise-descend profile reaching field elevation 0 at the end.
fn synthetic_flight(start_minute: u32) -> Vec<FlightRecord> {
    let t0 = timestamp(start_minute);
    (0..60)
        .map(|i| {
            let alt = match i {
                0..=9 => (i as f64) * 20.0,
                10..=49 => 200.0,
                _ => 200.0 - ((i - 49) as f64) * 20.0,
            };
            FlightRecord {
                timestamp: t0 + Duration::seconds(i),
                alt_msl: Some(alt),
                alt_gps: Some(alt + 15.0),
                vspd: Some(-250.0),
                ias: Some(65.0),
            }
        })
        .collect()
}

fn test_params() -> DetectionParams {
    DetectionParams {
        order: 2,
        min_climb_ft: 50.0,
        lookback_seconds: 30,
        field_elevation_ft: 0.0,
        elevation_tolerance_ft: 20.0,
        lead_seconds: 10,
    }
}

/// Detect the single approach in one synthetic flight and export it
/// into the corpus's unclassified bucket.
fn export_one_approach(corpus: &LabeledCorpus, start_minute: u32) {
    let series = synthetic_flight(start_minute);
    let segments = detect_approaches(&series, &test_params()).expect("detection should run");
    assert_eq!(segments.len(), 1);
    let written = export_segments(&segments, &corpus.bucket_dir(Label::Unclassified))
        .expect("export should succeed");
    assert_eq!(written.len(), 1);
}

fn bucket_count(corpus: &LabeledCorpus, label: Label) -> usize {
    corpus.files_in(label).expect("bucket listing").len()
}

#[test]
fn exported_segment_reloads_with_identical_timestamps() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let corpus = LabeledCorpus::new(tmp.path());
    corpus.ensure_buckets().expect("create buckets");
    export_one_approach(&corpus, 0);

    let files = corpus
        .files_in(Label::Unclassified)
        .expect("bucket listing");
    assert_eq!(files.len(), 1);
    let name = files[0]
        .file_name()
        .and_then(|n| n.to_str())
        .expect("file name");
    // Lead 10 s before the minimum at 13:00:59
    assert_eq!(name, "approach_20240311_130049.csv");

    let records = load_flight_csv(&files[0]).expect("should re-load");
    assert_eq!(records.len(), 11);
    assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(records.iter().all(|r| r.alt_gps.is_some()));
}

#[test]
fn review_relocates_files_and_back_restores_them() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let corpus = LabeledCorpus::new(tmp.path());
    corpus.ensure_buckets().expect("create buckets");
    for minute in 0..4 {
        export_one_approach(&corpus, minute);
    }
    assert_eq!(bucket_count(&corpus, Label::Unclassified), 4);

    let mut session = ReviewSession::open(corpus.clone()).expect("open session");
    session.classify(Label::Good).expect("first -> good");
    session.classify(Label::Bad).expect("second -> bad");
    assert_eq!(bucket_count(&corpus, Label::Unclassified), 2);

    // Undo the bad call; the file returns to the unclassified bucket.
    assert!(session.back().expect("undo"));
    assert_eq!(bucket_count(&corpus, Label::Bad), 0);
    assert_eq!(bucket_count(&corpus, Label::Unclassified), 3);

    // Re-classify it and finish the pass.
    session.classify(Label::Good).expect("second -> good");
    session.classify(Label::Anomaly).expect("third -> anomaly");
    session.classify(Label::Skipped).expect("fourth -> skipped");
    assert!(session.is_done());

    assert_eq!(bucket_count(&corpus, Label::Good), 2);
    assert_eq!(bucket_count(&corpus, Label::Anomaly), 1);
    assert_eq!(bucket_count(&corpus, Label::Skipped), 1);
    assert_eq!(bucket_count(&corpus, Label::Unclassified), 0);
}

#[test]
fn labeled_corpus_splits_and_assembles_a_matrix() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let corpus = LabeledCorpus::new(tmp.path());
    corpus.ensure_buckets().expect("create buckets");

    // Ten approaches, labeled 6 good / 4 bad.
    for minute in 0..10 {
        export_one_approach(&corpus, minute);
    }
    let mut session = ReviewSession::open(corpus.clone()).expect("open session");
    for i in 0..10 {
        let label = if i < 6 { Label::Good } else { Label::Bad };
        session.classify(label).expect("classify");
    }

    // Deterministic stratified split of the file lists.
    let by_class = corpus.training_files().expect("scan corpus");
    let split = stratified_split(by_class.clone(), 0.8, 42).expect("split");
    assert_eq!(split.train.len() + split.test.len(), 10);
    let train_good = split.train.iter().filter(|(l, _)| *l == Label::Good).count();
    let train_bad = split.train.iter().filter(|(l, _)| *l == Label::Bad).count();
    assert_eq!(train_good, 4); // ⌊6×0.8⌋
    assert_eq!(train_bad, 3); // ⌊4×0.8⌋

    let again = stratified_split(by_class, 0.8, 42).expect("split again");
    assert_eq!(split, again);

    // Feature matrix over the whole labeled corpus. Each exported
    // segment holds 11 samples, so a 10-point trace fits.
    let params = FeatureParams {
        n_points: 10,
        derivatives: 1,
        require_vspd: true,
        ..FeatureParams::default()
    };
    let assembly = assemble_feature_matrix(&corpus, &params).expect("assemble");
    assert_eq!(assembly.matrix.len(), 10);
    assert_eq!(assembly.matrix.row_len, 20);
    assert_eq!(assembly.matrix.class_count(0), 6);
    assert_eq!(assembly.matrix.class_count(1), 4);
    assert_eq!(assembly.skipped_short, 0);
    assert_eq!(assembly.failed_files, 0);
    assert!(assembly
        .matrix
        .rows
        .iter()
        .all(|row| row.iter().all(|v| v.is_finite())));
}

#[test]
fn too_short_segments_are_counted_not_fatal() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let corpus = LabeledCorpus::new(tmp.path());
    corpus.ensure_buckets().expect("create buckets");
    export_one_approach(&corpus, 0);
    let mut session = ReviewSession::open(corpus.clone()).expect("open session");
    session.classify(Label::Good).expect("classify");

    // Demand a longer trace than the 11-sample segment can provide.
    let params = FeatureParams {
        n_points: 30,
        derivatives: 1,
        ..FeatureParams::default()
    };
    let assembly = assemble_feature_matrix(&corpus, &params).expect("assemble");
    assert!(assembly.matrix.is_empty());
    assert_eq!(assembly.skipped_short, 1);
}

#[test]
fn unreadable_labeled_file_is_isolated() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let corpus = LabeledCorpus::new(tmp.path());
    corpus.ensure_buckets().expect("create buckets");
    export_one_approach(&corpus, 0);
    let mut session = ReviewSession::open(corpus.clone()).expect("open session");
    session.classify(Label::Good).expect("classify");

    // Drop a malformed file into the same bucket.
    std::fs::write(
        corpus.bucket_dir(Label::Good).join("garbage.csv"),
        "not,a,segment\n1,2,3\n",
    )
    .expect("write garbage");

    let params = FeatureParams {
        n_points: 10,
        derivatives: 1,
        ..FeatureParams::default()
    };
    let assembly = assemble_feature_matrix(&corpus, &params).expect("assemble");
    assert_eq!(assembly.matrix.len(), 1);
    assert_eq!(assembly.failed_files, 1);
}

/// The corpus root can be nested anywhere; nothing depends on the
/// current working directory.
#[test]
fn corpus_layout_is_rooted() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let root = tmp.path().join("data").join("corpus");
    let corpus = LabeledCorpus::new(&root);
    corpus.ensure_buckets().expect("create nested buckets");
    assert!(root.join("unclassified").is_dir());
    assert!(root.join("anomalies").is_dir());
    assert_eq!(corpus.root(), Path::new(&root));
}
