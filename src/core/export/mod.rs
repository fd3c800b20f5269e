//! Export orchestration
//!
//! This module provides the export pipeline and its reporting:
//! - [`ExportPipeline`] - Runs one invocation end to end
//! - [`ExportReport`] / [`ExportOutcome`] - What an invocation produced

pub mod pipeline;
pub mod report;

pub use pipeline::ExportPipeline;
pub use report::{exit_codes, ExportOutcome, ExportReport};
