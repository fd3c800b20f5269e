//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with span timings
//! - JSON-formatted log files with daily or hourly rotation
//! - Level selection by configuration, CLI flag or `RUST_LOG`
//!
//! Every export invocation runs inside an `export` span that carries its
//! `invocation_id` and `timestamp`, so all lines of one run can be correlated.
//!
//! # Example
//!
//! ```no_run
//! use blobport::logging::init_logging;
//! use blobport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use blobport::log_error_with_context;
/// use blobport::domain::BlobportError;
///
/// let error = BlobportError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
