//! Tool configuration loaded from TOML files.
//!
//! Every tunable of the pipeline is a field here, so batch runs are
//! reproducible from a single file checked in next to the data.
//!
//! ## Loading Order
//!
//! 1. `GLIDEPATH_CONFIG` environment variable (path to TOML file)
//! 2. `glidepath.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Field elevation is the one setting with no built-in default: it is
//! airport-specific, and detection refuses to run without it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::detector::DetectionParams;
use crate::features::{AltitudeSource, FeatureParams};

/// Configuration and parameter-validation errors.
///
/// Produced fail-fast: parameter combinations are checked at call time,
/// before any data is scanned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the approach-analysis tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlidepathConfig {
    /// Approach detection tunables
    #[serde(default)]
    pub detection: DetectionSection,

    /// Feature extraction tunables
    #[serde(default)]
    pub features: FeatureSection,

    /// Dataset split tunables
    #[serde(default)]
    pub split: SplitSection,
}

/// `[detection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSection {
    /// Samples on each side that must be strictly higher for a local minimum
    #[serde(default = "defaults::order")]
    pub order: usize,
    /// Minimum climb (ft) above the minimum within the lookback window
    #[serde(default = "defaults::min_climb_ft")]
    pub min_climb_ft: f64,
    /// Lookback horizon (s) for the climb confirmation
    #[serde(default = "defaults::lookback_seconds")]
    pub lookback_seconds: i64,
    /// Ground elevation (ft MSL) at the expected landing site.
    /// No built-in default — must be set here or on the command line.
    #[serde(default)]
    pub field_elevation_ft: Option<f64>,
    /// Allowed deviation (ft) of a minimum from field elevation
    #[serde(default = "defaults::elevation_tolerance_ft")]
    pub elevation_tolerance_ft: f64,
    /// Exported segment duration (s) before the minimum
    #[serde(default = "defaults::lead_seconds")]
    pub lead_seconds: i64,
}

/// `[features]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSection {
    /// Trace length (final samples of each segment)
    #[serde(default = "defaults::n_points")]
    pub n_points: usize,
    /// 1 = altitude + rate, 2 = altitude + rate + acceleration
    #[serde(default = "defaults::derivatives")]
    pub derivatives: u8,
    /// Drop samples without a vertical-speed reading
    #[serde(default = "defaults::require_vspd")]
    pub require_vspd: bool,
    /// Altitude channel for the traces: "gps" or "baro"
    #[serde(default = "defaults::altitude_source")]
    pub altitude_source: String,
}

/// `[split]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSection {
    /// Train fraction, exclusive (0, 1)
    #[serde(default = "defaults::ratio")]
    pub ratio: f64,
    /// Shuffle seed — identical seed and input always yield identical splits
    #[serde(default = "defaults::seed")]
    pub seed: u64,
}

mod defaults {
    use crate::types::detection_defaults as d;

    pub fn order() -> usize {
        d::ORDER
    }
    pub fn min_climb_ft() -> f64 {
        d::MIN_CLIMB_FT
    }
    pub fn lookback_seconds() -> i64 {
        d::LOOKBACK_SECONDS
    }
    pub fn elevation_tolerance_ft() -> f64 {
        d::ELEVATION_TOLERANCE_FT
    }
    pub fn lead_seconds() -> i64 {
        d::LEAD_SECONDS
    }
    pub fn n_points() -> usize {
        d::N_POINTS
    }
    pub fn derivatives() -> u8 {
        1
    }
    pub fn require_vspd() -> bool {
        true
    }
    pub fn altitude_source() -> String {
        "gps".to_string()
    }
    pub fn ratio() -> f64 {
        d::SPLIT_RATIO
    }
    pub fn seed() -> u64 {
        d::SPLIT_SEED
    }
}

impl Default for DetectionSection {
    fn default() -> Self {
        Self {
            order: defaults::order(),
            min_climb_ft: defaults::min_climb_ft(),
            lookback_seconds: defaults::lookback_seconds(),
            field_elevation_ft: None,
            elevation_tolerance_ft: defaults::elevation_tolerance_ft(),
            lead_seconds: defaults::lead_seconds(),
        }
    }
}

impl Default for FeatureSection {
    fn default() -> Self {
        Self {
            n_points: defaults::n_points(),
            derivatives: defaults::derivatives(),
            require_vspd: defaults::require_vspd(),
            altitude_source: defaults::altitude_source(),
        }
    }
}

impl Default for SplitSection {
    fn default() -> Self {
        Self {
            ratio: defaults::ratio(),
            seed: defaults::seed(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl GlidepathConfig {
    /// Load configuration using the standard search order:
    /// 1. `GLIDEPATH_CONFIG` environment variable
    /// 2. `./glidepath.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("GLIDEPATH_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "loaded config from GLIDEPATH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "failed to load config from GLIDEPATH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "GLIDEPATH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("glidepath.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("loaded config from ./glidepath.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "failed to load ./glidepath.toml, using defaults");
                }
            }
        }

        info!("no glidepath.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path, validating range constraints.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every section. Fails fast on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.detection;
        if d.order == 0 {
            return Err(ConfigError::InvalidParameter(
                "detection.order must be at least 1".into(),
            ));
        }
        if d.min_climb_ft <= 0.0 || !d.min_climb_ft.is_finite() {
            return Err(ConfigError::InvalidParameter(format!(
                "detection.min_climb_ft must be positive, got {}",
                d.min_climb_ft
            )));
        }
        if d.lookback_seconds <= 0 {
            return Err(ConfigError::InvalidParameter(format!(
                "detection.lookback_seconds must be positive, got {}",
                d.lookback_seconds
            )));
        }
        if d.elevation_tolerance_ft < 0.0 || !d.elevation_tolerance_ft.is_finite() {
            return Err(ConfigError::InvalidParameter(format!(
                "detection.elevation_tolerance_ft must be non-negative, got {}",
                d.elevation_tolerance_ft
            )));
        }
        if d.lead_seconds <= 0 {
            return Err(ConfigError::InvalidParameter(format!(
                "detection.lead_seconds must be positive, got {}",
                d.lead_seconds
            )));
        }
        if let Some(elev) = d.field_elevation_ft {
            if !elev.is_finite() {
                return Err(ConfigError::InvalidParameter(
                    "detection.field_elevation_ft must be finite".into(),
                ));
            }
        }

        let f = &self.features;
        if f.n_points <= 1 {
            return Err(ConfigError::InvalidParameter(format!(
                "features.n_points must be greater than 1, got {}",
                f.n_points
            )));
        }
        if !(1..=2).contains(&f.derivatives) {
            return Err(ConfigError::InvalidParameter(format!(
                "features.derivatives must be 1 or 2, got {}",
                f.derivatives
            )));
        }
        AltitudeSource::parse(&f.altitude_source).ok_or_else(|| {
            ConfigError::InvalidParameter(format!(
                "features.altitude_source must be \"gps\" or \"baro\", got {:?}",
                f.altitude_source
            ))
        })?;

        let s = &self.split;
        if !(s.ratio > 0.0 && s.ratio < 1.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "split.ratio must be inside (0, 1), got {}",
                s.ratio
            )));
        }

        Ok(())
    }

    /// Build detection parameters, optionally overriding field elevation
    /// (command-line flag wins over the config file).
    ///
    /// Errors if field elevation is set in neither place — there is no
    /// universal default for it.
    pub fn detection_params(
        &self,
        field_elevation_override: Option<f64>,
    ) -> Result<DetectionParams, ConfigError> {
        let elevation = field_elevation_override
            .or(self.detection.field_elevation_ft)
            .ok_or_else(|| {
                ConfigError::InvalidParameter(
                    "field elevation is not set: pass --field-elevation or set \
                     detection.field_elevation_ft in glidepath.toml"
                        .into(),
                )
            })?;
        let params = DetectionParams {
            order: self.detection.order,
            min_climb_ft: self.detection.min_climb_ft,
            lookback_seconds: self.detection.lookback_seconds,
            field_elevation_ft: elevation,
            elevation_tolerance_ft: self.detection.elevation_tolerance_ft,
            lead_seconds: self.detection.lead_seconds,
        };
        params.validate()?;
        Ok(params)
    }

    /// Build feature-extraction parameters from the `[features]` section.
    pub fn feature_params(&self) -> Result<FeatureParams, ConfigError> {
        let source = AltitudeSource::parse(&self.features.altitude_source).ok_or_else(|| {
            ConfigError::InvalidParameter(format!(
                "features.altitude_source must be \"gps\" or \"baro\", got {:?}",
                self.features.altitude_source
            ))
        })?;
        let params = FeatureParams {
            n_points: self.features.n_points,
            derivatives: self.features.derivatives,
            require_vspd: self.features.require_vspd,
            altitude_source: source,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::detection_defaults;

    #[test]
    fn defaults_are_valid() {
        let config = GlidepathConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.detection.order, detection_defaults::ORDER);
        assert_eq!(config.features.n_points, detection_defaults::N_POINTS);
        assert!(config.detection.field_elevation_ft.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let toml_str = r#"
[detection]
field_elevation_ft = 5045.0
order = 100

[split]
seed = 7
"#;
        let config: GlidepathConfig = toml::from_str(toml_str).expect("should parse");
        config.validate().expect("should validate");
        assert_eq!(config.detection.order, 100);
        assert_eq!(config.detection.field_elevation_ft, Some(5045.0));
        // Untouched sections keep their defaults
        assert_eq!(
            config.detection.min_climb_ft,
            detection_defaults::MIN_CLIMB_FT
        );
        assert_eq!(config.split.seed, 7);
        assert!((config.split.ratio - detection_defaults::SPLIT_RATIO).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_order() {
        let mut config = GlidepathConfig::default();
        config.detection.order = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_ratio_at_bounds() {
        let mut config = GlidepathConfig::default();
        config.split.ratio = 1.0;
        assert!(config.validate().is_err());
        config.split.ratio = 0.0;
        assert!(config.validate().is_err());
        config.split.ratio = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_derivatives() {
        let mut config = GlidepathConfig::default();
        config.features.derivatives = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn detection_params_require_field_elevation() {
        let config = GlidepathConfig::default();
        assert!(config.detection_params(None).is_err());

        let params = config
            .detection_params(Some(5045.0))
            .expect("override should satisfy the requirement");
        assert!((params.field_elevation_ft - 5045.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cli_override_wins_over_file_value() {
        let mut config = GlidepathConfig::default();
        config.detection.field_elevation_ft = Some(1000.0);
        let params = config
            .detection_params(Some(2000.0))
            .expect("should build params");
        assert!((params.field_elevation_ft - 2000.0).abs() < f64::EPSILON);
    }
}
