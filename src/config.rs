//! Assessment configuration.
//!
//! One structure holds every tunable constant: baseline, probability band,
//! significance threshold and the weight table.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{
    Feature, FeatureWeight, Formula, DEFAULT_BASELINE, DEFAULT_WEIGHTS, PROBABILITY_CEILING,
    PROBABILITY_FLOOR,
};

const BASELINE_ENV: &str = "FRAILSIGHT_BASELINE";
const SIGNIFICANCE_ENV: &str = "FRAILSIGHT_SIGNIFICANCE_THRESHOLD";
const WEIGHTS_PATH_ENV: &str = "FRAILSIGHT_WEIGHTS_PATH";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the attribution engine and report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Population-average probability the walk starts from
    pub baseline: f64,

    /// Lower saturation bound for the final probability
    pub probability_floor: f64,

    /// Upper saturation bound for the final probability
    pub probability_ceiling: f64,

    /// Contributions whose magnitude does not exceed this are not listed as
    /// risk or protective factors
    pub significance_threshold: f64,

    /// One row per feature
    pub weights: Vec<FeatureWeight>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            baseline: DEFAULT_BASELINE,
            probability_floor: PROBABILITY_FLOOR,
            probability_ceiling: PROBABILITY_CEILING,
            significance_threshold: 0.01,
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

impl AssessmentConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or fails validation.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        tracing::debug!("Loaded assessment config from {:?}", path);
        Ok(cfg)
    }

    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - FRAILSIGHT_WEIGHTS_PATH: JSON config file used as the starting point
    /// - FRAILSIGHT_BASELINE
    /// - FRAILSIGHT_SIGNIFICANCE_THRESHOLD
    ///
    /// Unusable values are logged and ignored.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = match std::env::var(WEIGHTS_PATH_ENV) {
            Ok(path) => match Self::from_json_file(Path::new(&path)) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Ignoring {}={}: {}", WEIGHTS_PATH_ENV, path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        if let Some(x) = parse_env_f64(BASELINE_ENV) {
            if x > cfg.probability_floor && x < cfg.probability_ceiling {
                cfg.baseline = x;
            } else {
                tracing::warn!("Ignoring {}={}: outside probability band", BASELINE_ENV, x);
            }
        }

        if let Some(x) = parse_env_f64(SIGNIFICANCE_ENV) {
            if x >= 0.0 {
                cfg.significance_threshold = x;
            } else {
                tracing::warn!("Ignoring {}={}: must be non-negative", SIGNIFICANCE_ENV, x);
            }
        }

        cfg
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.baseline,
            self.probability_floor,
            self.probability_ceiling,
            self.significance_threshold,
        ];
        if finite.iter().any(|x| !x.is_finite()) {
            return Err(ConfigError::Invalid("non-finite constant".to_string()));
        }
        if !(0.0..=1.0).contains(&self.probability_floor)
            || !(0.0..=1.0).contains(&self.probability_ceiling)
            || self.probability_floor >= self.probability_ceiling
        {
            return Err(ConfigError::Invalid(format!(
                "probability band [{}, {}] is not a sub-range of [0, 1]",
                self.probability_floor, self.probability_ceiling
            )));
        }
        if !(self.baseline > 0.0 && self.baseline < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "baseline {} must lie in (0, 1)",
                self.baseline
            )));
        }
        if self.significance_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "significance threshold must be non-negative".to_string(),
            ));
        }

        for feature in Feature::ALL {
            let rows = self.weights.iter().filter(|w| w.feature == feature).count();
            if rows != 1 {
                return Err(ConfigError::Invalid(format!(
                    "feature {feature} has {rows} weight rows, expected 1"
                )));
            }
        }

        for row in &self.weights {
            if !row.weight.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "feature {} has non-finite weight",
                    row.feature
                )));
            }
            match row.formula {
                Formula::ScaledByReference { reference }
                    if reference == 0.0 || !reference.is_finite() =>
                {
                    return Err(ConfigError::Invalid(format!(
                        "feature {} has unusable reference {}",
                        row.feature, reference
                    )));
                }
                Formula::Inverted { ceiling } if !ceiling.is_finite() => {
                    return Err(ConfigError::Invalid(format!(
                        "feature {} has non-finite ceiling",
                        row.feature
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn parse_env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|x| x.is_finite())
}
