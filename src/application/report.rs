//! Presentation adapter: turns numeric attributions into display strings.
//!
//! The engine never formats anything; every string shown to a user is built
//! here.

use serde::Serialize;

use crate::domain::{AttributionResult, Contribution, Feature, Significance};

/// Format a probability as a percentage with one decimal (`0.41` → `41.0%`).
#[must_use]
pub fn format_probability(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Format a contribution with an explicit sign and four decimals.
#[must_use]
pub fn format_contribution(c: f64) -> String {
    format!("{c:+.4}")
}

/// One row of the ranked attribution table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub feature: Feature,
    pub display_name: &'static str,
    pub contribution: String,
    pub value: String,
    pub direction: &'static str,
}

/// Entry of a risk-factor or protective-factor list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSummary {
    pub label: &'static str,
    pub value: f64,
    pub contribution: f64,
}

/// Everything the display surfaces need, as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub probability: String,
    pub baseline: String,
    /// Sorted by absolute contribution, largest first
    pub ranked: Vec<RankedRow>,
    pub risk_factors: Vec<FactorSummary>,
    pub protective_factors: Vec<FactorSummary>,
}

impl AssessmentReport {
    /// Build the report for a result.
    ///
    /// `threshold` separates risk and protective factors from negligible ones.
    #[must_use]
    pub fn build(result: &AttributionResult, threshold: f64) -> Self {
        let ranked = result.ranked();

        let factors = |wanted: Significance| -> Vec<FactorSummary> {
            ranked
                .iter()
                .filter(|c| Significance::classify(c.contribution, threshold) == wanted)
                .map(factor_summary)
                .collect()
        };

        Self {
            probability: format_probability(result.final_probability),
            baseline: format_probability(result.baseline),
            ranked: ranked.iter().map(ranked_row).collect(),
            risk_factors: factors(Significance::RiskFactor),
            protective_factors: factors(Significance::ProtectiveFactor),
        }
    }

    /// Plain-text rendering for terminals and logs-free output.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Predicted frailty probability: {} (baseline {})\n\n",
            self.probability, self.baseline
        ));

        let name_width = self
            .ranked
            .iter()
            .map(|r| r.display_name.len())
            .max()
            .unwrap_or(0)
            .max("Feature".len());
        out.push_str(&format!(
            "{:<name_width$}  {:>8}  {:>7}  {}\n",
            "Feature", "Value", "Effect", "Direction"
        ));
        for row in &self.ranked {
            out.push_str(&format!(
                "{:<name_width$}  {:>8}  {:>7}  {}\n",
                row.display_name, row.value, row.contribution, row.direction
            ));
        }

        let list = |title: &str, items: &[FactorSummary]| -> String {
            if items.is_empty() {
                return format!("\n{title}: none\n");
            }
            let joined: Vec<String> = items
                .iter()
                .map(|f| format!("{} ({})", f.label, format_contribution(f.contribution)))
                .collect();
            format!("\n{title}: {}\n", joined.join(", "))
        };
        out.push_str(&list("Risk factors", &self.risk_factors));
        out.push_str(&list("Protective factors", &self.protective_factors));
        out
    }
}

fn ranked_row(c: &Contribution) -> RankedRow {
    RankedRow {
        feature: c.feature,
        display_name: c.feature.display_name(),
        contribution: format_contribution(c.contribution),
        value: c.feature.domain().format_value(c.value),
        direction: c.direction().label(),
    }
}

fn factor_summary(c: &Contribution) -> FactorSummary {
    FactorSummary {
        label: c.feature.display_name(),
        value: c.value,
        contribution: c.contribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ClosedFormModel;
    use crate::domain::PatientRecord;
    use crate::ports::AttributionModel;

    fn reference_report() -> AssessmentReport {
        let result = ClosedFormModel::new()
            .attribute(&PatientRecord::reference())
            .expect("Should compute");
        AssessmentReport::build(&result, 0.01)
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_probability(0.41), "41.0%");
        assert_eq!(format_probability(0.35), "35.0%");
        assert_eq!(format_probability(0.0123), "1.2%");
        assert_eq!(format_contribution(0.08), "+0.0800");
        assert_eq!(format_contribution(-0.04), "-0.0400");
    }

    #[test]
    fn test_reference_summary() {
        let report = reference_report();
        assert_eq!(report.probability, "41.0%");
        assert_eq!(report.baseline, "35.0%");
        assert_eq!(report.ranked.len(), 11);
        assert_eq!(report.ranked[0].display_name, "Age");
        assert_eq!(report.ranked[0].contribution, "+0.0800");
        assert_eq!(report.ranked[0].value, "71");
        assert_eq!(report.ranked[0].direction, "increases risk");
    }

    #[test]
    fn test_factor_partition() {
        let report = reference_report();

        let risk: Vec<&str> = report.risk_factors.iter().map(|f| f.label).collect();
        let protective: Vec<&str> = report.protective_factors.iter().map(|f| f.label).collect();
        assert_eq!(risk, vec!["Age", "BMI"]);
        assert_eq!(protective, vec!["PA", "Smoke"]);

        // CRP (+0.01) and HGB (-0.01) sit exactly on the threshold.
        for label in ["CRP", "HGB"] {
            assert!(!risk.contains(&label));
            assert!(!protective.contains(&label));
        }

        for row in &report.ranked {
            let in_risk = risk.contains(&row.display_name);
            let in_protective = protective.contains(&row.display_name);
            assert!(!(in_risk && in_protective));
        }
    }

    #[test]
    fn test_neutral_rows() {
        let report = reference_report();
        let fall = report
            .ranked
            .iter()
            .find(|r| r.feature == Feature::Fall)
            .expect("Row should exist");
        assert_eq!(fall.direction, "neutral");
        assert_eq!(fall.contribution, "+0.0000");
    }

    #[test]
    fn test_zero_contributions_render_unsigned_neutral() {
        let reference = PatientRecord::reference();
        let values = reference.iter().map(|(f, v)| match f {
            Feature::Pa => (f, 2.0),
            Feature::Smoke => (f, 1.0),
            _ => (f, v),
        });
        let record = PatientRecord::from_pairs(values).expect("Should build");
        let model = ClosedFormModel::new();
        let result = model.attribute(&record).expect("Should compute");
        let report = AssessmentReport::build(&result, 0.01);

        for feature in [Feature::Pa, Feature::Smoke] {
            let row = report
                .ranked
                .iter()
                .find(|r| r.feature == feature)
                .expect("Row should exist");
            assert_eq!(row.contribution, "+0.0000");
            assert_eq!(row.direction, "neutral");
        }
        assert!(report.protective_factors.is_empty());
        assert!(!report.to_text().contains("-0.0000"));
    }

    #[test]
    fn test_text_rendering() {
        let text = reference_report().to_text();
        assert!(text.starts_with("Predicted frailty probability: 41.0% (baseline 35.0%)"));
        assert!(text.contains("Risk factors: Age (+0.0800), BMI (+0.0500)"));
        assert!(text.contains("Protective factors: PA (-0.0400), Smoke (-0.0300)"));
    }
}
