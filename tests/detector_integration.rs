//! Detector acceptance tests over full-scale synthetic flight profiles.
//!
//! Builds 1 Hz altitude series the shape of a real pattern flight —
//! cruise, then a 200-second final descent to the field — and runs
//! detection with production-scale parameters.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use glidepath::{detect_approaches, DetectionParams, FlightRecord};

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 11)
        .expect("valid date")
        .and_hms_opt(13, 0, 0)
        .expect("valid time")
}

/// 1000 samples at 1 Hz: flat at 6000 ft, descending linearly to
/// 5045 ft over the last 200 seconds.
fn descent_to_prescott() -> Vec<FlightRecord> {
    let t0 = base_time();
    (0..1000)
        .map(|i| {
            let alt = if i < 800 {
                6000.0
            } else {
                6000.0 - ((i - 800) as f64) * (955.0 / 199.0)
            };
            FlightRecord {
                timestamp: t0 + Duration::seconds(i),
                alt_msl: Some(alt),
                alt_gps: Some(alt - 20.0),
                vspd: Some(if i < 800 { 0.0 } else { -290.0 }),
                ias: Some(95.0),
            }
        })
        .collect()
}

fn prescott_params() -> DetectionParams {
    DetectionParams {
        order: 150,
        min_climb_ft: 500.0,
        lookback_seconds: 180,
        field_elevation_ft: 5045.0,
        elevation_tolerance_ft: 500.0,
        lead_seconds: 60,
    }
}

#[test]
fn linear_descent_yields_exactly_one_segment_at_the_last_sample() {
    let series = descent_to_prescott();
    let segments = detect_approaches(&series, &prescott_params()).expect("should detect");

    assert_eq!(segments.len(), 1, "expected exactly one approach");
    let seg = &segments[0];

    // The minimum is the last sample of the series.
    let last = series.last().expect("non-empty series");
    assert_eq!(seg.end, last.timestamp);
    assert_eq!(seg.start, seg.end - Duration::seconds(60));
    assert!(seg.start < seg.end);

    // 61 one-second samples fall inside the inclusive window.
    assert_eq!(seg.records.len(), 61);
    assert!(seg
        .records
        .iter()
        .all(|r| r.timestamp >= seg.start && r.timestamp <= seg.end));
}

#[test]
fn wrong_field_elevation_rejects_the_descent() {
    let series = descent_to_prescott();
    let params = DetectionParams {
        field_elevation_ft: 9000.0,
        ..prescott_params()
    };
    let segments = detect_approaches(&series, &params).expect("should run");
    assert!(segments.is_empty());
}

#[test]
fn series_shorter_than_the_window_yields_no_segments() {
    // 2×150+1 = 301 samples required; provide 300.
    let series: Vec<FlightRecord> = descent_to_prescott().into_iter().take(300).collect();
    let segments = detect_approaches(&series, &prescott_params()).expect("should run");
    assert!(segments.is_empty());
}

#[test]
fn repeated_detection_is_identical() {
    let series = descent_to_prescott();
    let params = prescott_params();
    let first = detect_approaches(&series, &params).expect("first run");
    let second = detect_approaches(&series, &params).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn go_around_above_the_field_is_not_an_approach() {
    // Descend from 6000 ft but level off and climb away at 5700 ft —
    // 655 ft above the field, outside the 500 ft tolerance.
    let t0 = base_time();
    let series: Vec<FlightRecord> = (0..1000)
        .map(|i| {
            let alt = match i {
                0..=599 => 6000.0,
                600..=699 => 6000.0 - ((i - 599) as f64) * 3.0, // descend to 5700
                700..=799 => 5700.0 + ((i - 699) as f64) * 3.0, // climb back
                _ => 6000.0,
            };
            FlightRecord {
                timestamp: t0 + Duration::seconds(i),
                alt_msl: Some(alt),
                alt_gps: None,
                vspd: None,
                ias: None,
            }
        })
        .collect();

    let segments = detect_approaches(&series, &prescott_params()).expect("should run");
    assert!(segments.is_empty());
}
