//! Portfolio dashboard core: load one spreadsheet of portfolio positions,
//! classify its columns, filter it and aggregate it for display.
//!
//! The egui binary in `main.rs` is only a consumer of this crate; everything
//! here is independent of rendering.

pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod labels;
pub mod pipeline;

pub use config::DashboardConfig;
pub use error::SourceError;
pub use pipeline::{DashboardSnapshot, Pipeline};
