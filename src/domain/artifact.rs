//! Export artifact naming
//!
//! Each invocation uploads exactly one object whose name is derived from the
//! invocation timestamp: `data-export-{timestamp}.csv`. The timestamp keeps its
//! colons and dots; any escaping needed on the wire is the sink adapter's job.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every export artifact
pub const ARTIFACT_PREFIX: &str = "data-export-";

/// Extension of every export artifact
pub const ARTIFACT_EXTENSION: &str = ".csv";

/// Renders an invocation timestamp as ISO 8601 with millisecond precision
///
/// ```
/// use blobport::domain::artifact::invocation_timestamp;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
/// assert_eq!(invocation_timestamp(&ts), "2025-03-01T12:00:00.000Z");
/// ```
pub fn invocation_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Name of the object written by one export invocation
///
/// # Examples
///
/// ```
/// use blobport::domain::ArtifactName;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
/// let name = ArtifactName::for_invocation(&ts);
/// assert_eq!(name.as_str(), "data-export-2025-03-01T12:00:00.000Z.csv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Builds the artifact name for an invocation started at `timestamp`
    pub fn for_invocation(timestamp: &DateTime<Utc>) -> Self {
        Self(format!(
            "{ARTIFACT_PREFIX}{}{ARTIFACT_EXTENSION}",
            invocation_timestamp(timestamp)
        ))
    }

    /// Returns the artifact name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_artifact_name_format() {
        let ts = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let name = ArtifactName::for_invocation(&ts);
        assert!(name.as_str().starts_with(ARTIFACT_PREFIX));
        assert!(name.as_str().ends_with(ARTIFACT_EXTENSION));
        assert_eq!(name.to_string(), "data-export-2024-12-31T23:59:59.000Z.csv");
    }

    #[test]
    fn test_artifact_name_keeps_milliseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() + Duration::milliseconds(678);
        let name = ArtifactName::for_invocation(&ts);
        assert_eq!(name.as_str(), "data-export-2024-01-02T03:04:05.678Z.csv");
    }

    #[test]
    fn test_distinct_invocations_get_distinct_names() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = first + Duration::milliseconds(1);
        assert_ne!(
            ArtifactName::for_invocation(&first),
            ArtifactName::for_invocation(&second)
        );
    }
}
