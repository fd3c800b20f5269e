//! Result type aliases for Blobport

use super::errors::{BlobportError, ExportError};

/// Result type alias for process-level operations
///
/// # Examples
///
/// ```
/// use blobport::domain::result::Result;
/// use blobport::domain::errors::BlobportError;
///
/// fn failing_function() -> Result<()> {
///     Err(BlobportError::Configuration("missing value".to_string()))
/// }
///
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, BlobportError>;

/// Result type alias for the stages of an export invocation
pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> ExportResult<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_export_result_err() {
        let result: ExportResult<()> = Err(ExportError::SinkUpload("boom".to_string()));
        assert!(result.is_err());
    }
}
