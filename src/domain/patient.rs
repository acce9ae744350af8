//! Patient attributes for frailty risk assessment.
//!
//! The 11 features collected by the assessment form, their accepted input
//! keys, display names and valid domains.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Clinical features used by the frailty model.
///
/// Declaration order is the fixed display order of the force plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Five-times sit-to-stand test: 0 = ≤12 s, 1 = >12 s
    Ftsst,
    /// Number of complications: 0 = none, 1 = one, 2 = two or more
    Complications,
    /// History of falls: 0 = no, 1 = yes
    Fall,
    /// C-reactive protein in mg/L
    Crp,
    /// Physical activity: 0 = high, 1 = medium, 2 = low
    Pa,
    /// Hemoglobin in g/L
    Hgb,
    /// Smoking: 0 = no, 1 = yes
    Smoke,
    /// Gender: 0 = male, 1 = female
    Gender,
    /// Age in years
    Age,
    /// Body mass index in kg/m²
    Bmi,
    /// Activities of daily living: 0 = independent, 1 = limited
    Adl,
}

/// Value kind of a feature, which drives validation and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Whole number on a range (age)
    Integer,
    /// Binary or unordered selector
    Categorical,
    /// Ordered selector
    Ordinal,
    /// Real-valued measurement
    Continuous,
}

/// Valid input domain of a feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureDomain {
    pub kind: FeatureKind,
    pub min: f64,
    pub max: f64,
    /// Increment used by the form when stepping the value
    pub step: f64,
}

impl FeatureDomain {
    /// Whether `value` lies in this domain (including integrality for
    /// non-continuous kinds).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() || value < self.min || value > self.max {
            return false;
        }
        match self.kind {
            FeatureKind::Continuous => true,
            _ => value.fract() == 0.0,
        }
    }

    /// Format a value the way the form displays it.
    ///
    /// Fractional values of discrete kinds are printed as given rather than
    /// rounded.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        match self.kind {
            FeatureKind::Continuous => format!("{value:.1}"),
            _ if value.fract() == 0.0 => format!("{value:.0}"),
            _ => format!("{value}"),
        }
    }
}

impl Feature {
    /// All features in display order.
    pub const ALL: [Feature; 11] = [
        Feature::Ftsst,
        Feature::Complications,
        Feature::Fall,
        Feature::Crp,
        Feature::Pa,
        Feature::Hgb,
        Feature::Smoke,
        Feature::Gender,
        Feature::Age,
        Feature::Bmi,
        Feature::Adl,
    ];

    /// Canonical machine key.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ftsst => "ftsst",
            Self::Complications => "complications",
            Self::Fall => "fall",
            Self::Crp => "crp",
            Self::Pa => "pa",
            Self::Hgb => "hgb",
            Self::Smoke => "smoke",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::Bmi => "bmi",
            Self::Adl => "adl",
        }
    }

    /// Human-readable label used in charts and tables.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ftsst => "FTSST",
            Self::Complications => "Complications",
            Self::Fall => "History of falls",
            Self::Crp => "CRP",
            Self::Pa => "PA",
            Self::Hgb => "HGB",
            Self::Smoke => "Smoke",
            Self::Gender => "Gender",
            Self::Age => "Age",
            Self::Bmi => "BMI",
            Self::Adl => "ADL",
        }
    }

    /// Input domain for this feature.
    #[must_use]
    pub fn domain(&self) -> FeatureDomain {
        use FeatureKind::{Categorical, Continuous, Integer, Ordinal};

        let (kind, min, max, step) = match self {
            Self::Age => (Integer, 50.0, 100.0, 1.0),
            Self::Bmi => (Continuous, 15.0, 40.0, 0.1),
            Self::Crp => (Continuous, 0.0, 30.0, 0.1),
            Self::Hgb => (Continuous, 50.0, 250.0, 1.0),
            Self::Pa | Self::Complications => (Ordinal, 0.0, 2.0, 1.0),
            Self::Gender | Self::Smoke | Self::Ftsst | Self::Adl | Self::Fall => {
                (Categorical, 0.0, 1.0, 1.0)
            }
        };

        FeatureDomain {
            kind,
            min,
            max,
            step,
        }
    }

    /// Option labels for selector features, indexed by value.
    #[must_use]
    pub fn options(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Gender => Some(&["male", "female"]),
            Self::Smoke | Self::Fall => Some(&["no", "yes"]),
            Self::Ftsst => Some(&["≤12 s", ">12 s"]),
            Self::Adl => Some(&["independent", "limited"]),
            Self::Pa => Some(&["high", "medium", "low"]),
            Self::Complications => Some(&["none", "one", "two or more"]),
            Self::Age | Self::Bmi | Self::Crp | Self::Hgb => None,
        }
    }

    /// Resolve an input key, accepting the legacy form names.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let lowered = key.trim().to_ascii_lowercase();
        let feature = match lowered.as_str() {
            "ftsst" => Self::Ftsst,
            "complications" => Self::Complications,
            "fall" | "falls" | "fall_history" => Self::Fall,
            "crp" | "bl_crp" => Self::Crp,
            "pa" | "physical_activity" => Self::Pa,
            "hgb" | "bl_hgb" | "hemoglobin" => Self::Hgb,
            "smoke" | "smoking" => Self::Smoke,
            "gender" => Self::Gender,
            "age" => Self::Age,
            "bmi" => Self::Bmi,
            "adl" => Self::Adl,
            _ => return None,
        };
        Some(feature)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors raised while building a record from untyped input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attribute {0} given more than once")]
    DuplicateAttribute(Feature),

    #[error("Attribute {feature} has non-finite value {value}")]
    NonFinite { feature: Feature, value: f64 },
}

/// Immutable set of patient attribute values.
///
/// A record may be incomplete; completeness is checked when attributions are
/// computed, range validity by [`PatientRecord::validate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct PatientRecord {
    values: BTreeMap<Feature, f64>,
}

impl PatientRecord {
    /// Build a record from typed pairs.
    ///
    /// # Errors
    /// Returns an error on duplicate features or non-finite values.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (Feature, f64)>,
    {
        let mut values = BTreeMap::new();
        for (feature, value) in pairs {
            if !value.is_finite() {
                return Err(RecordError::NonFinite { feature, value });
            }
            if values.insert(feature, value).is_some() {
                return Err(RecordError::DuplicateAttribute(feature));
            }
        }
        Ok(Self { values })
    }

    /// Build a record from string keys (canonical or legacy form names).
    ///
    /// # Errors
    /// Returns an error on unknown keys, keys that resolve to the same
    /// feature, or non-finite values.
    pub fn from_named<I, K>(pairs: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let typed = pairs
            .into_iter()
            .map(|(key, value)| {
                Feature::from_key(key.as_ref())
                    .map(|f| (f, value))
                    .ok_or_else(|| RecordError::UnknownAttribute(key.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_pairs(typed)
    }

    /// Value of a feature, if present.
    #[must_use]
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    /// Features absent from this record, in display order.
    #[must_use]
    pub fn missing(&self) -> Vec<Feature> {
        Feature::ALL
            .iter()
            .copied()
            .filter(|f| !self.values.contains_key(f))
            .collect()
    }

    /// Number of features present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over present features in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    /// Check every present value against its feature domain.
    ///
    /// # Errors
    /// Returns all violations as human-readable messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .iter()
            .filter_map(|(feature, value)| {
                let domain = feature.domain();
                if domain.contains(value) {
                    return None;
                }
                Some(match domain.kind {
                    FeatureKind::Continuous | FeatureKind::Integer => format!(
                        "{} {} out of range [{}, {}]",
                        feature.display_name(),
                        value,
                        domain.min,
                        domain.max
                    ),
                    FeatureKind::Categorical | FeatureKind::Ordinal => format!(
                        "{} {} must be an integer in [{}, {}]",
                        feature.display_name(),
                        value,
                        domain.min,
                        domain.max
                    ),
                })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Default form values: a 71-year-old at the reference BMI and CRP with
    /// no functional limitations.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            values: REFERENCE_VALUES.iter().copied().collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for PatientRecord {
    type Error = RecordError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_named(map)
    }
}

impl From<PatientRecord> for BTreeMap<String, f64> {
    fn from(record: PatientRecord) -> Self {
        record
            .values
            .into_iter()
            .map(|(f, v)| (f.key().to_string(), v))
            .collect()
    }
}

const REFERENCE_VALUES: [(Feature, f64); 11] = [
    (Feature::Ftsst, 0.0),
    (Feature::Complications, 0.0),
    (Feature::Fall, 0.0),
    (Feature::Crp, 9.0),
    (Feature::Pa, 0.0),
    (Feature::Hgb, 150.0),
    (Feature::Smoke, 0.0),
    (Feature::Gender, 0.0),
    (Feature::Age, 71.0),
    (Feature::Bmi, 26.0),
    (Feature::Adl, 0.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order_matches_enum_order() {
        let mut sorted = Feature::ALL;
        sorted.sort();
        assert_eq!(sorted, Feature::ALL);
    }

    #[test]
    fn test_from_key_accepts_legacy_names() {
        assert_eq!(Feature::from_key("bl_crp"), Some(Feature::Crp));
        assert_eq!(Feature::from_key("bl_hgb"), Some(Feature::Hgb));
        assert_eq!(Feature::from_key("FTSST"), Some(Feature::Ftsst));
        assert_eq!(Feature::from_key(" PA "), Some(Feature::Pa));
        assert_eq!(
            Feature::from_key("Complications"),
            Some(Feature::Complications)
        );
        assert_eq!(Feature::from_key("weight"), None);
    }

    #[test]
    fn test_from_named_rejects_unknown_and_duplicates() {
        let err = PatientRecord::from_named([("age", 70.0), ("height", 1.8)]).unwrap_err();
        assert_eq!(err, RecordError::UnknownAttribute("height".to_string()));

        let err = PatientRecord::from_named([("crp", 1.0), ("bl_crp", 2.0)]).unwrap_err();
        assert_eq!(err, RecordError::DuplicateAttribute(Feature::Crp));

        let err = PatientRecord::from_named([("bmi", f64::INFINITY)]).unwrap_err();
        assert_eq!(
            err,
            RecordError::NonFinite {
                feature: Feature::Bmi,
                value: f64::INFINITY,
            }
        );

        let err = PatientRecord::from_named([("bmi", f64::NAN)]).unwrap_err();
        assert!(matches!(err, RecordError::NonFinite { .. }));
    }

    #[test]
    fn test_missing_reports_display_order() {
        let record = PatientRecord::from_pairs([(Feature::Age, 70.0), (Feature::Crp, 3.0)])
            .expect("Should build");
        let missing = record.missing();
        assert_eq!(missing.len(), 9);
        assert_eq!(missing[0], Feature::Ftsst);
        assert!(!missing.contains(&Feature::Age));
        assert!(PatientRecord::reference().missing().is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(PatientRecord::reference().validate().is_ok());

        let invalid = PatientRecord::from_pairs([
            (Feature::Age, 40.0),
            (Feature::Pa, 1.5),
            (Feature::Gender, 2.0),
            (Feature::Bmi, 22.3),
        ])
        .expect("Should build");
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.starts_with("Age 40")));
    }

    #[test]
    fn test_format_value_by_kind() {
        assert_eq!(Feature::Age.domain().format_value(71.0), "71");
        assert_eq!(Feature::Bmi.domain().format_value(26.0), "26.0");
        assert_eq!(Feature::Pa.domain().format_value(2.0), "2");
        assert_eq!(Feature::Pa.domain().format_value(1.5), "1.5");
        assert_eq!(Feature::Gender.domain().format_value(0.25), "0.25");
    }

    #[test]
    fn test_serde_uses_canonical_keys() {
        let json = r#"{"FTSST":1,"bl_crp":4.5,"age":80}"#;
        let record: PatientRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record.get(Feature::Ftsst), Some(1.0));
        assert_eq!(record.get(Feature::Crp), Some(4.5));

        let out = serde_json::to_value(&record).expect("Should serialize");
        assert_eq!(out["crp"], serde_json::json!(4.5));
        assert!(out.get("bl_crp").is_none());
    }
}
