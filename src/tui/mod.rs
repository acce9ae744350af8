//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Patient attribute entry form
//! - Result view with probability gauge, force plot and factor lists

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
