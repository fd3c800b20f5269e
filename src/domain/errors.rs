//! Domain error types
//!
//! This module defines the error hierarchy for Blobport. [`BlobportError`] covers
//! process-level failures (configuration loading, I/O, logging setup) while
//! [`ExportError`] is the taxonomy of a single export invocation.
//! Neither type exposes third-party driver or HTTP client errors.

use std::fmt;
use thiserror::Error;

/// Main Blobport error type
#[derive(Debug, Error)]
pub enum BlobportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors raised by an export invocation
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Scheduling errors
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Failure taxonomy of one export invocation
///
/// Every variant carries a human-readable message. An empty collection is not an
/// error and therefore has no variant here.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A required connection or configuration value is absent or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The source store connection could not be established
    #[error("Failed to connect to source store: {0}")]
    SourceConnect(String),

    /// Server selection or connection establishment exceeded its timeout
    #[error("Source store connection timed out: {0}")]
    SourceTimeout(String),

    /// Network-level failure while talking to the source store
    #[error("Source store network error: {0}")]
    SourceNetwork(String),

    /// The collection read failed for a non-network reason
    #[error("Source query failed: {0}")]
    SourceQuery(String),

    /// The destination container does not exist
    #[error("Container \"{0}\" does not exist. Please create it first")]
    DestinationMissing(String),

    /// The record set could not be turned into CSV
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The sink client could not be built
    #[error("Failed to create sink client: {0}")]
    SinkConnect(String),

    /// A sink request other than the upload failed
    #[error("Sink request failed: {0}")]
    SinkRequest(String),

    /// The upload to the sink failed
    #[error("Upload failed: {0}")]
    SinkUpload(String),

    /// Releasing an acquired store client failed
    #[error("Failed to release {resource} connection: {message}")]
    ResourceRelease {
        /// Which store the connection belonged to
        resource: &'static str,
        /// Error message
        message: String,
    },

    /// The overall invocation deadline elapsed
    #[error("Export did not finish within {0}s")]
    DeadlineExceeded(u64),
}

/// Fieldless classification of [`ExportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportErrorKind {
    Configuration,
    SourceConnect,
    SourceTimeout,
    SourceNetwork,
    SourceQuery,
    DestinationMissing,
    Serialization,
    SinkConnect,
    SinkRequest,
    SinkUpload,
    ResourceRelease,
    DeadlineExceeded,
}

impl ExportError {
    /// Returns the classification of this error
    pub fn kind(&self) -> ExportErrorKind {
        match self {
            Self::Configuration(_) => ExportErrorKind::Configuration,
            Self::SourceConnect(_) => ExportErrorKind::SourceConnect,
            Self::SourceTimeout(_) => ExportErrorKind::SourceTimeout,
            Self::SourceNetwork(_) => ExportErrorKind::SourceNetwork,
            Self::SourceQuery(_) => ExportErrorKind::SourceQuery,
            Self::DestinationMissing(_) => ExportErrorKind::DestinationMissing,
            Self::Serialization(_) => ExportErrorKind::Serialization,
            Self::SinkConnect(_) => ExportErrorKind::SinkConnect,
            Self::SinkRequest(_) => ExportErrorKind::SinkRequest,
            Self::SinkUpload(_) => ExportErrorKind::SinkUpload,
            Self::ResourceRelease { .. } => ExportErrorKind::ResourceRelease,
            Self::DeadlineExceeded(_) => ExportErrorKind::DeadlineExceeded,
        }
    }

    /// Operator guidance logged next to the error
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            ExportErrorKind::Configuration => {
                "Set every required connection value before starting the exporter."
            }
            ExportErrorKind::SourceTimeout => {
                "MongoDB connection timed out. Check your network settings and connection string."
            }
            ExportErrorKind::SourceNetwork => {
                "MongoDB network error. Ensure the Atlas IP access list includes this host."
            }
            ExportErrorKind::DestinationMissing => {
                "Create the blob container; the exporter never creates it."
            }
            ExportErrorKind::DeadlineExceeded => {
                "Raise export.deadline_seconds or investigate slow store responses."
            }
            _ => "An unexpected error occurred.",
        }
    }

    /// True when the failure originated at the source store
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self.kind(),
            ExportErrorKind::SourceConnect
                | ExportErrorKind::SourceTimeout
                | ExportErrorKind::SourceNetwork
                | ExportErrorKind::SourceQuery
        )
    }
}

impl fmt::Display for ExportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::SourceConnect => "source_connect",
            Self::SourceTimeout => "source_timeout",
            Self::SourceNetwork => "source_network",
            Self::SourceQuery => "source_query",
            Self::DestinationMissing => "destination_missing",
            Self::Serialization => "serialization",
            Self::SinkConnect => "sink_connect",
            Self::SinkRequest => "sink_request",
            Self::SinkUpload => "sink_upload",
            Self::ResourceRelease => "resource_release",
            Self::DeadlineExceeded => "deadline_exceeded",
        };
        f.write_str(name)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BlobportError {
    fn from(err: std::io::Error) -> Self {
        BlobportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BlobportError {
    fn from(err: serde_json::Error) -> Self {
        BlobportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BlobportError {
    fn from(err: toml::de::Error) -> Self {
        BlobportError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blobport_error_display() {
        let err = BlobportError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_export_error_conversion() {
        let export_err = ExportError::SourceTimeout("no primary".to_string());
        let err: BlobportError = export_err.into();
        assert!(matches!(err, BlobportError::Export(_)));
    }

    #[test]
    fn test_destination_missing_message() {
        let err = ExportError::DestinationMissing("exports".to_string());
        assert_eq!(
            err.to_string(),
            "Container \"exports\" does not exist. Please create it first"
        );
        assert_eq!(err.kind(), ExportErrorKind::DestinationMissing);
    }

    #[test]
    fn test_source_failure_classification() {
        assert!(ExportError::SourceConnect("x".into()).is_source_failure());
        assert!(ExportError::SourceTimeout("x".into()).is_source_failure());
        assert!(ExportError::SourceNetwork("x".into()).is_source_failure());
        assert!(ExportError::SourceQuery("x".into()).is_source_failure());
        assert!(!ExportError::SinkUpload("x".into()).is_source_failure());
    }

    #[test]
    fn test_hints() {
        assert!(ExportError::SourceTimeout("x".into())
            .hint()
            .contains("timed out"));
        assert!(ExportError::SourceNetwork("x".into())
            .hint()
            .contains("IP access list"));
        assert_eq!(
            ExportError::SinkUpload("x".into()).hint(),
            "An unexpected error occurred."
        );
    }

    #[test]
    fn test_release_error_display() {
        let err = ExportError::ResourceRelease {
            resource: "source",
            message: "socket closed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to release source connection: socket closed"
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ExportErrorKind::SourceTimeout.to_string(), "source_timeout");
        assert_eq!(
            ExportErrorKind::DestinationMissing.to_string(),
            "destination_missing"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: BlobportError = io_err.into();
        assert!(matches!(err, BlobportError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: BlobportError = toml_err.into();
        assert!(matches!(err, BlobportError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
