//! Assessment service: one submission in, one explained prediction out.
//!
//! Each call is independent. Nothing is cached between submissions.

use crate::config::AssessmentConfig;
use crate::domain::{
    project_tornado, project_waterfall, AttributionResult, PatientRecord, TornadoChart,
    WaterfallChart,
};
use crate::ports::AttributionModel;
use crate::{FrailsightError, Result};

use super::report::AssessmentReport;

/// Explained prediction for a single record.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub result: AttributionResult,
    pub waterfall: WaterfallChart,
    pub tornado: TornadoChart,
    pub report: AssessmentReport,
}

/// Service for running frailty assessments.
pub struct AssessmentService<M>
where
    M: AttributionModel,
{
    model: M,
    significance_threshold: f64,
}

impl<M> AssessmentService<M>
where
    M: AttributionModel,
{
    /// Create a new assessment service.
    pub fn new(model: M, config: &AssessmentConfig) -> Self {
        Self {
            model,
            significance_threshold: config.significance_threshold,
        }
    }

    /// Run the full pipeline on a record without range checks.
    ///
    /// # Errors
    /// Returns error if a required attribute is missing.
    pub fn assess(&self, record: &PatientRecord) -> Result<Assessment> {
        let result = self.model.attribute(record)?;

        let waterfall = project_waterfall(&result);
        let tornado = project_tornado(&result);
        let report = AssessmentReport::build(&result, self.significance_threshold);

        if result.was_clamped() {
            tracing::debug!(
                raw = result.raw_probability,
                clamped = result.final_probability,
                "Probability saturated"
            );
        }
        tracing::info!(
            model = self.model.name(),
            probability = result.final_probability,
            risk_factors = report.risk_factors.len(),
            protective_factors = report.protective_factors.len(),
            "Assessment complete"
        );

        Ok(Assessment {
            result,
            waterfall,
            tornado,
            report,
        })
    }

    /// Validate attribute ranges, then assess.
    ///
    /// # Errors
    /// Returns `FrailsightError::Validation` listing every out-of-range value,
    /// or the attribution error.
    pub fn assess_validated(&self, record: &PatientRecord) -> Result<Assessment> {
        if let Err(errors) = record.validate() {
            tracing::warn!(violations = errors.len(), "Rejected out-of-range record");
            return Err(FrailsightError::Validation(errors.join(", ")));
        }
        self.assess(record)
    }
}
