//! Closed-form adapter: Implementation of AttributionModel over a fixed
//! weight table.
//!
//! Every feature is scored by its row in the table and the rows are iterated
//! uniformly in display order; there is no per-feature special casing.

use crate::config::{AssessmentConfig, ConfigError};
use crate::domain::{
    AttributionError, AttributionResult, Contribution, Feature, FeatureWeight, PatientRecord,
};
use crate::ports::AttributionModel;

/// Hand-authored linear attribution model.
#[derive(Debug, Clone)]
pub struct ClosedFormModel {
    baseline: f64,
    floor: f64,
    ceiling: f64,
    /// Weight rows in display order
    rows: Vec<FeatureWeight>,
}

impl Default for ClosedFormModel {
    fn default() -> Self {
        Self::from_valid_config(&AssessmentConfig::default())
    }
}

impl ClosedFormModel {
    /// Create a model with the default weight table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model from a configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the configuration is inconsistent.
    pub fn with_config(config: &AssessmentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!(
            baseline = config.baseline,
            rows = config.weights.len(),
            "Scoring table loaded"
        );
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: &AssessmentConfig) -> Self {
        let mut rows = config.weights.clone();
        rows.sort_by_key(|row| row.feature);

        Self {
            baseline: config.baseline,
            floor: config.probability_floor,
            ceiling: config.probability_ceiling,
            rows,
        }
    }
}

impl AttributionModel for ClosedFormModel {
    fn name(&self) -> &str {
        "closed-form"
    }

    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn attribute(&self, record: &PatientRecord) -> Result<AttributionResult, AttributionError> {
        let contributions = self
            .rows
            .iter()
            .map(|row| {
                let value = record
                    .get(row.feature)
                    .ok_or(AttributionError::MissingAttribute(row.feature))?;
                Ok(Contribution {
                    feature: row.feature,
                    value,
                    contribution: row.contribution(value),
                })
            })
            .collect::<Result<Vec<_>, AttributionError>>()?;

        let raw_probability =
            self.baseline + contributions.iter().map(|c| c.contribution).sum::<f64>();
        let final_probability = raw_probability.max(self.floor).min(self.ceiling);

        Ok(AttributionResult {
            baseline: self.baseline,
            contributions,
            raw_probability,
            final_probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Formula;

    fn record(overrides: &[(Feature, f64)]) -> PatientRecord {
        let mut values: Vec<(Feature, f64)> = PatientRecord::reference().iter().collect();
        for (feature, value) in overrides {
            if let Some(slot) = values.iter_mut().find(|(f, _)| f == feature) {
                slot.1 = *value;
            }
        }
        PatientRecord::from_pairs(values).expect("Should build")
    }

    /// Youngest, leanest, no inflammation, highly active non-smoker.
    fn minimum_risk() -> PatientRecord {
        record(&[
            (Feature::Age, 50.0),
            (Feature::Bmi, 15.0),
            (Feature::Crp, 0.0),
            (Feature::Pa, 0.0),
            (Feature::Smoke, 0.0),
        ])
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    fn score(model: &ClosedFormModel, record: &PatientRecord) -> AttributionResult {
        model.attribute(record).expect("Should compute")
    }

    #[test]
    fn test_reference_record() {
        let model = ClosedFormModel::new();
        let result = score(&model, &PatientRecord::reference());

        let expected = [
            (Feature::Age, 0.08),
            (Feature::Bmi, 0.05),
            (Feature::Crp, 0.01),
            (Feature::Pa, -0.04),
            (Feature::Smoke, -0.03),
            (Feature::Hgb, -0.01),
            (Feature::Ftsst, 0.0),
            (Feature::Complications, 0.0),
            (Feature::Fall, 0.0),
            (Feature::Adl, 0.0),
            (Feature::Gender, 0.0),
        ];
        for (feature, value) in expected {
            let c = result.contribution(feature).expect("Should be present");
            assert_close(c.contribution, value);
        }

        assert_close(result.contribution_sum(), 0.06);
        assert_close(result.final_probability, 0.41);
        assert!(!result.was_clamped());
    }

    #[test]
    fn test_contributions_follow_display_order() {
        let model = ClosedFormModel::new();
        let result = score(&model, &PatientRecord::reference());
        let order: Vec<Feature> = result.contributions.iter().map(|c| c.feature).collect();
        assert_eq!(order, Feature::ALL.to_vec());
    }

    #[test]
    fn test_minimum_risk_is_below_reference() {
        let model = ClosedFormModel::new();
        let reference = score(&model, &PatientRecord::reference());
        let low = score(&model, &minimum_risk());
        assert!(low.final_probability < reference.final_probability);

        let expected = 0.35 + 0.08 * 50.0 / 71.0 + 0.05 * 15.0 / 26.0 - 0.08;
        assert_close(low.final_probability, expected);
    }

    #[test]
    fn test_inactive_smoker_scores_above_reference() {
        let model = ClosedFormModel::new();
        let reference = score(&model, &PatientRecord::reference());
        let smoker = record(&[(Feature::Pa, 2.0), (Feature::Smoke, 1.0)]);
        let inactive = score(&model, &smoker);
        let shift = inactive.final_probability - reference.final_probability;
        assert_close(shift, 0.07);

        for feature in [Feature::Pa, Feature::Smoke] {
            let c = inactive.contribution(feature).expect("Should exist");
            assert_eq!(c.contribution, 0.0);
            assert!(c.contribution.is_sign_positive());
        }
    }

    #[test]
    fn test_missing_attribute_fails() {
        let model = ClosedFormModel::new();
        let partial: Vec<(Feature, f64)> = PatientRecord::reference()
            .iter()
            .filter(|(f, _)| *f != Feature::Bmi && *f != Feature::Adl)
            .collect();
        let partial = PatientRecord::from_pairs(partial).expect("Should build");

        let err = model.attribute(&partial).unwrap_err();
        assert_eq!(err, AttributionError::MissingAttribute(Feature::Bmi));

        let err = model.attribute(&PatientRecord::default()).unwrap_err();
        assert_eq!(err, AttributionError::MissingAttribute(Feature::Ftsst));
    }

    #[test]
    fn test_hemoglobin_is_constant() {
        let model = ClosedFormModel::new();
        for hgb in [50.0, 80.0, 150.0, 199.0, 250.0] {
            let result = score(&model, &record(&[(Feature::Hgb, hgb)]));
            let c = result.contribution(Feature::Hgb).expect("Should exist");
            assert_eq!(c.contribution, -0.01);
            assert_eq!(c.value, hgb);
        }
    }

    #[test]
    fn test_physical_activity_and_smoking() {
        let model = ClosedFormModel::new();
        let pa = |v: f64| {
            model
                .attribute(&record(&[(Feature::Pa, v)]))
                .expect("Should compute")
                .contribution(Feature::Pa)
                .map(|c| c.contribution)
                .expect("Should be present")
        };
        assert_close(pa(0.0), -0.04);
        assert_close(pa(1.0), -0.02);
        assert_close(pa(2.0), 0.0);
        assert!(pa(0.0) <= pa(1.0) && pa(1.0) <= pa(2.0));

        let smoke = |v: f64| {
            model
                .attribute(&record(&[(Feature::Smoke, v)]))
                .expect("Should compute")
                .contribution(Feature::Smoke)
                .map(|c| c.contribution)
                .expect("Should be present")
        };
        assert_close(smoke(0.0), -0.03);
        assert_close(smoke(1.0), 0.0);
    }

    #[test]
    fn test_sum_identity_and_band_over_domains() {
        let model = ClosedFormModel::new();
        let grid = |f: Feature| -> Vec<f64> {
            let d = f.domain();
            vec![d.min, (d.min + d.max) / 2.0, d.max]
        };

        for age in grid(Feature::Age) {
            for bmi in grid(Feature::Bmi) {
                for crp in grid(Feature::Crp) {
                    for flags in 0..8u32 {
                        let on = |bit: u32| f64::from((flags >> bit) & 1);
                        let r = record(&[
                            (Feature::Age, age.round()),
                            (Feature::Bmi, bmi),
                            (Feature::Crp, crp),
                            (Feature::Ftsst, on(0)),
                            (Feature::Fall, on(1)),
                            (Feature::Smoke, on(2)),
                            (Feature::Complications, 2.0 * on(0)),
                            (Feature::Pa, 2.0 * on(1)),
                        ]);
                        let result = score(&model, &r);

                        assert_close(
                            result.raw_probability,
                            result.baseline + result.contribution_sum(),
                        );
                        assert!(result.final_probability >= 0.01);
                        assert!(result.final_probability <= 0.99);
                        if (0.01..=0.99).contains(&result.raw_probability) {
                            assert_eq!(result.final_probability, result.raw_probability);
                        } else if result.raw_probability > 0.99 {
                            assert_eq!(result.final_probability, 0.99);
                        } else {
                            assert_eq!(result.final_probability, 0.01);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_clamps_to_nearest_bound() {
        let mut cfg = AssessmentConfig::default();
        for row in cfg.weights.iter_mut() {
            row.weight *= 20.0;
        }
        let model = ClosedFormModel::with_config(&cfg).expect("Valid config");

        let high = score(
            &model,
            &record(&[(Feature::Ftsst, 1.0), (Feature::Complications, 2.0)]),
        );
        assert!(high.raw_probability > 0.99);
        assert_eq!(high.final_probability, 0.99);
        assert!(high.was_clamped());

        let mut cfg = AssessmentConfig::default();
        for row in cfg.weights.iter_mut() {
            if row.feature == Feature::Pa {
                row.weight = -0.5;
            }
        }
        let model = ClosedFormModel::with_config(&cfg).expect("Valid config");
        let low = score(&model, &minimum_risk());
        assert!(low.raw_probability < 0.01);
        assert_eq!(low.final_probability, 0.01);
        assert!(low.was_clamped());
    }

    #[test]
    fn test_custom_table_is_respected() {
        let mut cfg = AssessmentConfig::default();
        cfg.baseline = 0.2;
        for row in cfg.weights.iter_mut() {
            if row.feature == Feature::Hgb {
                *row = FeatureWeight::new(
                    Feature::Hgb,
                    -0.02,
                    Formula::ScaledByReference { reference: 150.0 },
                );
            }
        }
        let model = ClosedFormModel::with_config(&cfg).expect("Valid config");
        assert_eq!(model.baseline(), 0.2);

        let result = score(&model, &PatientRecord::reference());
        let hgb = result.contribution(Feature::Hgb).expect("Should exist");
        assert_close(hgb.contribution, -0.02);
        assert_close(result.final_probability, 0.2 + 0.05);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut cfg = AssessmentConfig::default();
        cfg.weights.pop();
        assert!(ClosedFormModel::with_config(&cfg).is_err());
    }
}
