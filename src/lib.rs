//! # Frailsight
//!
//! Explainable frailty risk assessment.
//!
//! This crate provides:
//! - An additive attribution model scoring 11 patient attributes
//! - Projection of attributions onto waterfall and tornado force charts
//! - A terminal UI and a batch CLI for entering records and reading results
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, AttributionResult, chart primitives)
//! - `ports`: Trait definitions for the scoring backend
//! - `adapters`: Concrete implementations (closed-form table, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Consolidated tunable constants
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{AttributionResult, Contribution, Feature, PatientRecord};

/// Result type for Frailsight operations
pub type Result<T> = std::result::Result<T, FrailsightError>;

/// Main error type for Frailsight
#[derive(Debug, thiserror::Error)]
pub enum FrailsightError {
    #[error("Attribution failed: {0}")]
    Attribution(#[from] domain::AttributionError),

    #[error("Invalid record: {0}")]
    Record(#[from] domain::RecordError),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
