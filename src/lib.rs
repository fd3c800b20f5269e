// Blobport - MongoDB to Azure Blob Storage CSV Export
// Copyright (c) 2025 Blobport Contributors
// Licensed under the MIT License

//! # Blobport - MongoDB to Azure Blob Storage CSV Export
//!
//! Blobport periodically reads every document of one MongoDB collection,
//! renders the batch as CSV and uploads it to an existing Azure Blob Storage
//! container as `data-export-<ISO 8601 timestamp>.csv`.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** the full contents of a collection with the MongoDB driver
//! - **Transforming** the batch into CSV with a header taken from the first record
//! - **Loading** the payload into Blob Storage over the REST API
//! - **Scheduling** invocations on a six-field cron expression
//!
//! ## Architecture
//!
//! Blobport follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (export pipeline, CSV serialization, scheduling)
//! - [`adapters`] - External integrations (MongoDB, Azure Blob Storage, in-memory)
//! - [`domain`] - Core domain types and the error taxonomy
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blobport::config::load_config;
//! use blobport::core::export::ExportPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Configuration from the host environment, no file
//!     let config = load_config(None::<&str>)?;
//!
//!     let pipeline = ExportPipeline::from_config(&config);
//!     let report = pipeline.run_export(chrono::Utc::now()).await;
//!
//!     if let Some(artifact) = report.artifact() {
//!         println!("Uploaded {artifact}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! An invocation never returns an error. Every failure is classified as an
//! [`domain::ExportError`] and carried in the report's outcome:
//!
//! ```rust,no_run
//! use blobport::core::export::{ExportOutcome, ExportPipeline};
//!
//! # async fn example(pipeline: ExportPipeline) {
//! let report = pipeline.run_export(chrono::Utc::now()).await;
//! match &report.outcome {
//!     ExportOutcome::Exported { artifact, .. } => println!("Uploaded {artifact}"),
//!     ExportOutcome::NothingToExport => println!("Collection is empty"),
//!     ExportOutcome::Failed(e) => eprintln!("{}: {}", e.kind(), e.hint()),
//! }
//! # }
//! ```
//!
//! ## Logging
//!
//! Blobport uses structured logging with the `tracing` crate. All events of
//! one invocation share an `export` span carrying its `invocation_id`.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
