//! Adapters layer: Concrete implementations of ports.
//!
//! - `closed_form`: fixed weight-table attribution model
//! - `sanitize`: clinical value redaction for logs

pub mod closed_form;
pub mod sanitize;

pub use closed_form::ClosedFormModel;
