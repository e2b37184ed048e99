//! Renderers for stack analysis reports.
//!
//! - [`terminal`]: colored summary and verbose dependency breakdown.
//! - [`json`]: machine-readable summary or full report.
//! - [`html`]: persists the backend-rendered HTML page to a temporary file.

pub mod html;
pub mod json;
pub mod terminal;
