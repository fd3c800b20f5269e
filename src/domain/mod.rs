//! Domain models and types for Blobport.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Records** ([`Record`], [`ExportBatch`]) as read from the source store
//! - **Artifact naming** ([`ArtifactName`]) for uploaded objects
//! - **Error types** ([`BlobportError`], [`ExportError`], [`ExportErrorKind`])
//! - **Result type aliases** ([`Result`], [`ExportResult`])
//!
//! # Error Handling
//!
//! Process-level operations return [`Result<T>`]; stages of an export invocation
//! return [`ExportResult<T>`] so the pipeline can classify every failure:
//!
//! ```rust
//! use blobport::domain::{ExportError, ExportErrorKind, ExportResult};
//!
//! fn check_container(exists: bool) -> ExportResult<()> {
//!     if !exists {
//!         return Err(ExportError::DestinationMissing("exports".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_container(false).unwrap_err();
//! assert_eq!(err.kind(), ExportErrorKind::DestinationMissing);
//! ```

pub mod artifact;
pub mod errors;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use artifact::ArtifactName;
pub use errors::{BlobportError, ExportError, ExportErrorKind};
pub use record::{ExportBatch, Record};
pub use result::{ExportResult, Result};
