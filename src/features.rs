//! Segment feature extraction for the approach classifier.
//!
//! Turns the final portion of an approach recording into a fixed-length
//! numeric vector: the altitude trace, its discrete derivative as an
//! altitude-rate trace (ft/min), and optionally the derivative of that as
//! a vertical-acceleration trace. Layout is positional —
//! `[alt_0..alt_{n-1}, rate_0..rate_{n-1}, (accel_0..accel_{n-1})]`.
//!
//! Inputs shorter than the trace length are an expected, silently-skipped
//! condition (`Ok(None)`), not a fault.

use tracing::debug;

use crate::config::ConfigError;
use crate::types::{detection_defaults, FlightRecord};

/// Altitude channel the traces are read from.
///
/// The classifier corpora are built from the GPS channel; barometric is
/// available for logs without GPS altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AltitudeSource {
    Gps,
    Baro,
}

impl AltitudeSource {
    /// Parse a config-file spelling ("gps" / "baro").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gps" => Some(Self::Gps),
            "baro" | "msl" => Some(Self::Baro),
            _ => None,
        }
    }

    fn read(self, record: &FlightRecord) -> Option<f64> {
        match self {
            Self::Gps => record.alt_gps,
            Self::Baro => record.alt_msl,
        }
    }
}

/// Tunables for feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureParams {
    /// Trace length: the final `n_points` valid samples are used
    pub n_points: usize,
    /// 1 = altitude + rate, 2 = altitude + rate + acceleration
    pub derivatives: u8,
    /// Drop samples without a vertical-speed reading before taking the
    /// final `n_points`
    pub require_vspd: bool,
    /// Altitude channel for the traces
    pub altitude_source: AltitudeSource,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            n_points: detection_defaults::N_POINTS,
            derivatives: 1,
            require_vspd: true,
            altitude_source: AltitudeSource::Gps,
        }
    }
}

impl FeatureParams {
    /// Length of the produced vector: `n_points × {2,3}`.
    pub fn vector_len(&self) -> usize {
        self.n_points * (1 + self.derivatives as usize)
    }

    /// Range-check the parameter combination. Called by `extract_features`
    /// before any data is scanned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_points <= 1 {
            return Err(ConfigError::InvalidParameter(format!(
                "n_points must be greater than 1, got {}",
                self.n_points
            )));
        }
        if !(1..=2).contains(&self.derivatives) {
            return Err(ConfigError::InvalidParameter(format!(
                "derivatives must be 1 or 2, got {}",
                self.derivatives
            )));
        }
        Ok(())
    }
}

/// Extract one feature vector from a segment recording.
///
/// Returns `Ok(None)` when fewer than `n_points` valid samples remain
/// after filtering, or when the resulting vector would contain a
/// non-finite value (rejected, never padded).
///
/// The rate trace assumes roughly uniform unit spacing between
/// consecutive retained samples (the loggers' native 1 Hz interval);
/// at other rates the ×60 ft/min conversion is a documented noise source.
pub fn extract_features(
    records: &[FlightRecord],
    params: &FeatureParams,
) -> Result<Option<Vec<f64>>, ConfigError> {
    params.validate()?;

    let valid: Vec<f64> = records
        .iter()
        .filter(|r| !params.require_vspd || r.vspd.is_some())
        .filter_map(|r| params.altitude_source.read(r))
        .collect();

    if valid.len() < params.n_points {
        return Ok(None);
    }

    // Final n_points samples, chronological order preserved.
    let alts = &valid[valid.len() - params.n_points..];

    // Discrete derivative prepended with the first value: rate[0] is the
    // zero-change assumption at the boundary.
    let mut rates = Vec::with_capacity(params.n_points);
    rates.push(0.0);
    for i in 1..alts.len() {
        rates.push((alts[i] - alts[i - 1]) * 60.0);
    }

    let mut vector = Vec::with_capacity(params.vector_len());
    vector.extend_from_slice(alts);
    vector.extend_from_slice(&rates);

    if params.derivatives == 2 {
        let mut accels = Vec::with_capacity(params.n_points);
        accels.push(0.0);
        for i in 1..rates.len() {
            accels.push(rates[i] - rates[i - 1]);
        }
        vector.extend_from_slice(&accels);
    }

    if vector.iter().any(|v| !v.is_finite()) {
        debug!("feature vector rejected: non-finite entry");
        return Ok(None);
    }

    Ok(Some(vector))
}
