//! External store integrations for Blobport.
//!
//! This module provides adapters for the two stores an export touches:
//!
//! - [`source`] - Document store access (MongoDB)
//! - [`sink`] - Object store access (Azure Blob Storage)
//! - [`memory`] - In-memory stores with call journaling and failure injection
//! - [`lifecycle`] - Scoped acquisition and idempotent release of connections
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate the driver and HTTP
//! dependencies. The export pipeline only sees the connector traits, so any
//! store pair can be plugged in:
//!
//! ```rust
//! use blobport::adapters::memory::{MemorySink, MemorySource};
//! use blobport::adapters::sink::SinkConnector;
//! use blobport::adapters::source::SourceConnector;
//! use std::sync::Arc;
//!
//! let source: Arc<dyn SourceConnector> = Arc::new(MemorySource::new(Vec::new()));
//! let sink: Arc<dyn SinkConnector> = Arc::new(MemorySink::new().with_container("exports"));
//! ```

pub mod lifecycle;
pub mod memory;
pub mod sink;
pub mod source;

pub use lifecycle::{Releasable, Scoped};
