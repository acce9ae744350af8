//! Attribution model port: Trait for explainable risk scoring.

use crate::domain::{AttributionError, AttributionResult, PatientRecord};

/// Trait for models that explain a risk probability as a baseline plus
/// additive per-feature contributions.
///
/// Implementations must be pure: the same record always yields the same
/// result, and `baseline + sum(contributions)` equals the unclamped
/// probability.
pub trait AttributionModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Probability before any patient-specific adjustment.
    fn baseline(&self) -> f64;

    /// Compute the attribution for a record.
    ///
    /// # Errors
    /// Returns `AttributionError::MissingAttribute` if any required feature
    /// is absent from `record`.
    fn attribute(&self, record: &PatientRecord) -> Result<AttributionResult, AttributionError>;
}
