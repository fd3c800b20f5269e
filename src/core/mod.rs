//! Core business logic for Blobport.
//!
//! This module contains the export workflow and its trigger.
//!
//! # Modules
//!
//! - [`export`] - Export pipeline and invocation reports
//! - [`transform`] - Record batch to CSV conversion
//! - [`schedule`] - Cron-driven invocation of the pipeline
//!
//! # Export Workflow
//!
//! One invocation runs these steps in order, stopping at the first failure:
//!
//! 1. **Check configuration**: every connection value must be present
//! 2. **Connect**: open the MongoDB connection
//! 3. **Fetch**: read the whole collection; an empty one ends the run
//! 4. **Serialize**: header from the first record's keys, one row per record
//! 5. **Verify destination**: the blob container must already exist
//! 6. **Upload**: write `data-export-<timestamp>.csv`
//! 7. **Release**: close every acquired connection, whatever happened above
//!
//! # Example
//!
//! ```rust,no_run
//! use blobport::config::load_config;
//! use blobport::core::export::ExportPipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(Some("blobport.toml"))?;
//! let pipeline = ExportPipeline::from_config(&config);
//!
//! let report = pipeline.run_export(chrono::Utc::now()).await;
//! println!("Outcome: {}", report.outcome.label());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod schedule;
pub mod transform;
