//! Domain layer: Core assessment types and logic.
//!
//! Pure Rust types with no I/O. Everything here is deterministic and
//! serializable.

mod attribution;
pub mod chart;
mod patient;

pub use attribution::{
    AttributionError, AttributionResult, Contribution, Direction, FeatureWeight, Formula,
    Significance, DEFAULT_BASELINE, DEFAULT_WEIGHTS, PROBABILITY_CEILING, PROBABILITY_FLOOR,
};
pub use chart::{project_tornado, project_waterfall, ChartSegment, TornadoChart, WaterfallChart};
pub use patient::{Feature, FeatureDomain, FeatureKind, PatientRecord, RecordError};
