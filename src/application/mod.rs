//! Application layer: Use cases and services.
//!
//! Orchestrates the attribution model, chart projection and report
//! formatting for one submission at a time.

mod assessment;
pub mod report;

pub use assessment::{Assessment, AssessmentService};
pub use report::{AssessmentReport, FactorSummary, RankedRow};
