//! Ports layer: Trait definitions for external operations.
//!
//! These traits define the boundary between the application and the scoring
//! backend, so a fitted model can replace the closed-form table.

mod attribution_model;

pub use attribution_model::AttributionModel;
