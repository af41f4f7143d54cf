//! Approach segment detection over an altitude time series.
//!
//! Scans the barometric altitude channel for local minima, filters them by
//! field-elevation proximity and a prior-climb confirmation, and emits
//! time-bounded approach segments. A transient dip (turbulence, sensor
//! noise, a go-around well above the field) fails one of the two filters;
//! a genuine descent to the runway passes both.
//!
//! Detection is a pure function of the series and its parameters: no
//! hidden state, identical inputs always yield identical output.

use chrono::Duration;

use crate::config::ConfigError;
use crate::types::{detection_defaults, ApproachSegment, FlightRecord};

/// Tunables for approach detection.
///
/// `order` is a sample-count window, not a time window — its effective
/// duration depends on the log's sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    /// Neighbors on each side that must be strictly higher for a sample
    /// to qualify as a local minimum
    pub order: usize,
    /// Minimum altitude gain (ft) above the minimum within the lookback
    /// window to confirm a genuine descent
    pub min_climb_ft: f64,
    /// Time horizon (s) before the minimum within which the climb must
    /// be found
    pub lookback_seconds: i64,
    /// Ground elevation (ft MSL) at the expected landing site
    pub field_elevation_ft: f64,
    /// Maximum deviation (ft) of the minimum from field elevation
    pub elevation_tolerance_ft: f64,
    /// Duration (s) of the exported segment before the minimum
    pub lead_seconds: i64,
}

impl DetectionParams {
    /// Parameters with built-in defaults and the given field elevation.
    ///
    /// Field elevation is the one tunable without a universal default.
    pub fn new(field_elevation_ft: f64) -> Self {
        Self {
            order: detection_defaults::ORDER,
            min_climb_ft: detection_defaults::MIN_CLIMB_FT,
            lookback_seconds: detection_defaults::LOOKBACK_SECONDS,
            field_elevation_ft,
            elevation_tolerance_ft: detection_defaults::ELEVATION_TOLERANCE_FT,
            lead_seconds: detection_defaults::LEAD_SECONDS,
        }
    }

    /// Range-check the parameter combination. Called by `detect_approaches`
    /// before any data is scanned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order == 0 {
            return Err(ConfigError::InvalidParameter(
                "order must be at least 1".into(),
            ));
        }
        if self.min_climb_ft <= 0.0 || !self.min_climb_ft.is_finite() {
            return Err(ConfigError::InvalidParameter(format!(
                "min_climb_ft must be positive, got {}",
                self.min_climb_ft
            )));
        }
        if self.lookback_seconds <= 0 {
            return Err(ConfigError::InvalidParameter(format!(
                "lookback_seconds must be positive, got {}",
                self.lookback_seconds
            )));
        }
        if !self.field_elevation_ft.is_finite() {
            return Err(ConfigError::InvalidParameter(
                "field_elevation_ft must be finite".into(),
            ));
        }
        if self.elevation_tolerance_ft < 0.0 || !self.elevation_tolerance_ft.is_finite() {
            return Err(ConfigError::InvalidParameter(format!(
                "elevation_tolerance_ft must be non-negative, got {}",
                self.elevation_tolerance_ft
            )));
        }
        if self.lead_seconds <= 0 {
            return Err(ConfigError::InvalidParameter(format!(
                "lead_seconds must be positive, got {}",
                self.lead_seconds
            )));
        }
        Ok(())
    }
}

/// Detect landing approaches in one flight series.
///
/// The series must be sorted ascending by timestamp. Samples without a
/// barometric altitude are skipped for the minima search; the emitted
/// segment windows slice the full series.
///
/// Candidates are emitted in the order their minima appear. Overlapping
/// segments from nearby minima are all emitted — no deduplication or
/// merging is performed.
///
/// A series with fewer than `2×order+1` altitude samples yields an empty
/// result, not an error.
pub fn detect_approaches(
    series: &[FlightRecord],
    params: &DetectionParams,
) -> Result<Vec<ApproachSegment>, ConfigError> {
    params.validate()?;

    // Altitude and timestamp arrays aligned over the altitude-valid samples.
    let mut altitudes = Vec::with_capacity(series.len());
    let mut timestamps = Vec::with_capacity(series.len());
    for record in series {
        if let Some(alt) = record.alt_msl {
            altitudes.push(alt);
            timestamps.push(record.timestamp);
        }
    }

    let mut approaches = Vec::new();
    for idx in local_minima(&altitudes, params.order) {
        let a_min = altitudes[idx];
        let t_min = timestamps[idx];

        // Filter 1: the minimum must sit near the field, not mid-air.
        if (a_min - params.field_elevation_ft).abs() > params.elevation_tolerance_ft {
            continue;
        }

        // Filter 2: the aircraft must have been well above the minimum
        // shortly before it. The scan is bounded at 3×order samples;
        // samples older than the lookback horizon are skipped but do not
        // end the scan, so at low sample rates the count bound can
        // truncate the search before the time horizon is reached.
        let lookback_start = t_min - Duration::seconds(params.lookback_seconds);
        let scan_start = idx.saturating_sub(params.order * 3);
        let confirmed = (scan_start..idx).any(|j| {
            timestamps[j] >= lookback_start && altitudes[j] >= a_min + params.min_climb_ft
        });
        if !confirmed {
            continue;
        }

        let start = t_min - Duration::seconds(params.lead_seconds);
        let records: Vec<FlightRecord> = series
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= t_min)
            .cloned()
            .collect();
        approaches.push(ApproachSegment {
            start,
            end: t_min,
            records,
        });
    }

    Ok(approaches)
}

/// Indices of order-k local minima: samples strictly lower than every
/// in-range neighbor within `order` positions on each side. Ties never
/// qualify. An array shorter than `2×order+1` has no minima at all.
fn local_minima(values: &[f64], order: usize) -> Vec<usize> {
    if order == 0 || values.len() < 2 * order + 1 {
        return Vec::new();
    }

    let mut minima = Vec::new();
    for i in 0..values.len() {
        let lo = i.saturating_sub(order);
        let hi = (i + order).min(values.len() - 1);
        let is_min = (lo..=hi).all(|j| j == i || values[j] > values[i]);
        if is_min {
            minima.push(i);
        }
    }
    minima
}
