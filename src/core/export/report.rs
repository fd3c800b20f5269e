//! Export report and outcome
//!
//! An invocation always produces an [`ExportReport`]; failures are carried in
//! [`ExportOutcome::Failed`] instead of being returned as errors.

use crate::domain::{ArtifactName, ExportError, ExportErrorKind};
use std::time::Duration;
use uuid::Uuid;

/// Exit codes for `blobport export`
pub mod exit_codes {
    /// Exported, or nothing to export
    pub const SUCCESS: i32 = 0;
    /// A required configuration value is absent or invalid
    pub const CONFIGURATION: i32 = 2;
    /// The destination container does not exist
    pub const DESTINATION_MISSING: i32 = 3;
    /// The source store could not be reached or queried
    pub const SOURCE: i32 = 4;
    /// Any other failure
    pub const OTHER: i32 = 5;
}

/// How an invocation ended
#[derive(Debug)]
pub enum ExportOutcome {
    /// The payload was uploaded
    Exported {
        /// Name of the uploaded object
        artifact: ArtifactName,
        /// Number of records serialized
        document_count: usize,
        /// Payload size in bytes
        bytes: usize,
    },

    /// The collection was empty; nothing was serialized or uploaded
    NothingToExport,

    /// A pipeline step failed
    Failed(ExportError),
}

impl ExportOutcome {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exported { .. } => "exported",
            Self::NothingToExport => "nothing_to_export",
            Self::Failed(_) => "failed",
        }
    }

    /// Classification of the failure, if any
    pub fn error_kind(&self) -> Option<ExportErrorKind> {
        match self {
            Self::Failed(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Report of one export invocation
#[derive(Debug)]
pub struct ExportReport {
    /// Unique id of the invocation, also recorded on its tracing span
    pub invocation_id: Uuid,

    /// Invocation timestamp (ISO 8601, millisecond precision)
    pub timestamp: String,

    /// Final outcome
    pub outcome: ExportOutcome,

    /// Failures raised while releasing store connections
    ///
    /// These never change the outcome.
    pub release_errors: Vec<ExportError>,

    /// Wall-clock duration of the invocation
    pub duration: Duration,
}

impl ExportReport {
    /// Create a report for an invocation
    pub fn new(invocation_id: Uuid, timestamp: String, outcome: ExportOutcome) -> Self {
        Self {
            invocation_id,
            timestamp,
            outcome,
            release_errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a release failure
    pub fn add_release_error(&mut self, error: ExportError) {
        self.release_errors.push(error);
    }

    /// True for `Exported` and `NothingToExport`
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, ExportOutcome::Failed(_))
    }

    /// The uploaded artifact, if any
    pub fn artifact(&self) -> Option<&ArtifactName> {
        match &self.outcome {
            ExportOutcome::Exported { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&ExportError> {
        match &self.outcome {
            ExportOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Process exit code for a one-shot export
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            ExportOutcome::Exported { .. } | ExportOutcome::NothingToExport => {
                exit_codes::SUCCESS
            }
            ExportOutcome::Failed(e) if e.kind() == ExportErrorKind::Configuration => {
                exit_codes::CONFIGURATION
            }
            ExportOutcome::Failed(e) if e.kind() == ExportErrorKind::DestinationMissing => {
                exit_codes::DESTINATION_MISSING
            }
            ExportOutcome::Failed(e) if e.is_source_failure() => exit_codes::SOURCE,
            ExportOutcome::Failed(_) => exit_codes::OTHER,
        }
    }

    /// Log the report
    pub fn log_report(&self) {
        match &self.outcome {
            ExportOutcome::Exported {
                artifact,
                document_count,
                bytes,
            } => {
                tracing::info!(
                    artifact = %artifact,
                    document_count,
                    bytes,
                    duration_ms = self.duration.as_millis() as u64,
                    "Successfully uploaded CSV to Blob Storage"
                );
            }
            ExportOutcome::NothingToExport => {
                tracing::warn!(
                    duration_ms = self.duration.as_millis() as u64,
                    "No data found in the collection"
                );
            }
            ExportOutcome::Failed(e) => {
                tracing::error!(
                    kind = %e.kind(),
                    error = %e,
                    details = ?e,
                    duration_ms = self.duration.as_millis() as u64,
                    "Export failed"
                );
                tracing::error!(kind = %e.kind(), "{}", e.hint());
            }
        }

        if !self.release_errors.is_empty() {
            tracing::warn!(
                error_count = self.release_errors.len(),
                "Export completed with release errors"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use test_case::test_case;

    fn failed(error: ExportError) -> ExportReport {
        ExportReport::new(
            Uuid::new_v4(),
            "2025-03-01T12:00:00.000Z".to_string(),
            ExportOutcome::Failed(error),
        )
    }

    #[test]
    fn test_success_exit_codes() {
        let exported = ExportReport::new(
            Uuid::new_v4(),
            "2025-03-01T12:00:00.000Z".to_string(),
            ExportOutcome::Exported {
                artifact: ArtifactName::for_invocation(&Utc::now()),
                document_count: 3,
                bytes: 42,
            },
        );
        assert!(exported.is_success());
        assert!(exported.artifact().is_some());
        assert_eq!(exported.exit_code(), exit_codes::SUCCESS);

        let empty = ExportReport::new(
            Uuid::new_v4(),
            "2025-03-01T12:00:00.000Z".to_string(),
            ExportOutcome::NothingToExport,
        );
        assert!(empty.is_success());
        assert!(empty.artifact().is_none());
        assert_eq!(empty.exit_code(), exit_codes::SUCCESS);
    }

    #[test_case(ExportError::Configuration("x".into()), exit_codes::CONFIGURATION ; "configuration")]
    #[test_case(ExportError::DestinationMissing("x".into()), exit_codes::DESTINATION_MISSING ; "destination missing")]
    #[test_case(ExportError::SourceConnect("x".into()), exit_codes::SOURCE ; "source connect")]
    #[test_case(ExportError::SourceTimeout("x".into()), exit_codes::SOURCE ; "source timeout")]
    #[test_case(ExportError::SourceNetwork("x".into()), exit_codes::SOURCE ; "source network")]
    #[test_case(ExportError::SourceQuery("x".into()), exit_codes::SOURCE ; "source query")]
    #[test_case(ExportError::Serialization("x".into()), exit_codes::OTHER ; "serialization")]
    #[test_case(ExportError::SinkUpload("x".into()), exit_codes::OTHER ; "sink upload")]
    #[test_case(ExportError::DeadlineExceeded(50), exit_codes::OTHER ; "deadline")]
    fn test_failure_exit_codes(error: ExportError, expected: i32) {
        let report = failed(error);
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), expected);
    }

    #[test]
    fn test_release_errors_do_not_change_outcome() {
        let mut report = ExportReport::new(
            Uuid::new_v4(),
            "2025-03-01T12:00:00.000Z".to_string(),
            ExportOutcome::NothingToExport,
        );
        report.add_release_error(ExportError::ResourceRelease {
            resource: "source",
            message: "socket closed".to_string(),
        });
        assert!(report.is_success());
        assert_eq!(report.exit_code(), exit_codes::SUCCESS);
        assert_eq!(report.outcome.label(), "nothing_to_export");
    }
}
