//! Attribution types: per-feature weights, contributions and results.

use serde::{Deserialize, Serialize};

use super::patient::Feature;

/// How a feature value maps to a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formula {
    /// `weight * value / reference`
    ScaledByReference { reference: f64 },
    /// `weight * value`
    Direct,
    /// `weight * (ceiling - value)`; used with a negative weight so that the
    /// protective end of the scale lowers risk
    Inverted { ceiling: f64 },
    /// `weight`, independent of the value
    Constant,
}

/// One row of the weight table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: Feature,
    pub weight: f64,
    #[serde(flatten)]
    pub formula: Formula,
}

impl FeatureWeight {
    #[must_use]
    pub const fn new(feature: Feature, weight: f64, formula: Formula) -> Self {
        Self {
            feature,
            weight,
            formula,
        }
    }

    /// Signed contribution of `value` under this row.
    ///
    /// A zero contribution is always `+0.0`, so it never renders as a
    /// decrease.
    #[must_use]
    pub fn contribution(&self, value: f64) -> f64 {
        let c = match self.formula {
            Formula::ScaledByReference { reference } => self.weight * (value / reference),
            Formula::Direct => self.weight * value,
            Formula::Inverted { ceiling } => self.weight * (ceiling - value),
            Formula::Constant => self.weight,
        };
        if c == 0.0 {
            0.0
        } else {
            c
        }
    }
}

/// Default weight table.
///
/// HGB contributes a fixed -0.01 whatever the measured value; keep it that
/// way until a fitted coefficient is available.
pub const DEFAULT_WEIGHTS: [FeatureWeight; 11] = [
    FeatureWeight::new(
        Feature::Age,
        0.08,
        Formula::ScaledByReference { reference: 71.0 },
    ),
    FeatureWeight::new(Feature::Ftsst, 0.06, Formula::Direct),
    FeatureWeight::new(
        Feature::Bmi,
        0.05,
        Formula::ScaledByReference { reference: 26.0 },
    ),
    FeatureWeight::new(Feature::Complications, 0.04, Formula::Direct),
    FeatureWeight::new(Feature::Fall, 0.03, Formula::Direct),
    FeatureWeight::new(Feature::Adl, 0.02, Formula::Direct),
    FeatureWeight::new(
        Feature::Crp,
        0.01,
        Formula::ScaledByReference { reference: 9.0 },
    ),
    FeatureWeight::new(Feature::Gender, 0.04, Formula::Direct),
    FeatureWeight::new(Feature::Pa, -0.02, Formula::Inverted { ceiling: 2.0 }),
    FeatureWeight::new(Feature::Smoke, -0.03, Formula::Inverted { ceiling: 1.0 }),
    FeatureWeight::new(Feature::Hgb, -0.01, Formula::Constant),
];

/// Population-average frailty probability.
pub const DEFAULT_BASELINE: f64 = 0.35;

/// Saturation band for the final probability.
pub const PROBABILITY_FLOOR: f64 = 0.01;
pub const PROBABILITY_CEILING: f64 = 0.99;

/// Errors raised while computing attributions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributionError {
    #[error("Missing required attribute: {0}")]
    MissingAttribute(Feature),
}

/// Additive effect of one feature on the risk probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub feature: Feature,
    /// Input value the contribution was computed from
    pub value: f64,
    /// Signed effect; positive raises risk
    pub contribution: f64,
}

impl Contribution {
    #[must_use]
    pub fn direction(&self) -> Direction {
        Direction::of(self.contribution)
    }
}

/// Output of the attribution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub baseline: f64,
    /// One entry per feature, in display order
    pub contributions: Vec<Contribution>,
    /// `baseline + sum(contributions)` before clamping
    pub raw_probability: f64,
    /// Clamped to the probability band
    pub final_probability: f64,
}

impl AttributionResult {
    /// Sum of all contributions.
    #[must_use]
    pub fn contribution_sum(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// Contribution of a single feature.
    #[must_use]
    pub fn contribution(&self, feature: Feature) -> Option<&Contribution> {
        self.contributions.iter().find(|c| c.feature == feature)
    }

    /// Whether the raw probability fell outside the band.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        self.raw_probability != self.final_probability
    }

    /// Contributions sorted by absolute size, largest first.
    ///
    /// Ties keep display order.
    #[must_use]
    pub fn ranked(&self) -> Vec<Contribution> {
        let mut ranked = self.contributions.clone();
        ranked.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        ranked
    }
}

/// Qualitative direction of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    IncreasesRisk,
    DecreasesRisk,
    Neutral,
}

impl Direction {
    #[must_use]
    pub fn of(contribution: f64) -> Self {
        if contribution > 0.0 {
            Self::IncreasesRisk
        } else if contribution < 0.0 {
            Self::DecreasesRisk
        } else {
            Self::Neutral
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::IncreasesRisk => "increases risk",
            Self::DecreasesRisk => "decreases risk",
            Self::Neutral => "neutral",
        }
    }

    /// Chart colour (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            // #FF0D57
            Self::IncreasesRisk => (255, 13, 87),
            // #1E88E5
            Self::DecreasesRisk => (30, 136, 229),
            // #94A3B8
            Self::Neutral => (148, 163, 184),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary bucket of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    RiskFactor,
    ProtectiveFactor,
    NotSignificant,
}

impl Significance {
    /// Classify against a symmetric threshold; the bounds themselves are not
    /// significant.
    #[must_use]
    pub fn classify(contribution: f64, threshold: f64) -> Self {
        if contribution > threshold {
            Self::RiskFactor
        } else if contribution < -threshold {
            Self::ProtectiveFactor
        } else {
            Self::NotSignificant
        }
    }
}
