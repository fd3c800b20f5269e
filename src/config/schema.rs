//! Configuration schema types
//!
//! This module defines the configuration structure for Blobport. Every section
//! has serde defaults so the whole configuration can be produced from the host
//! environment alone; required values default to empty and are reported by
//! [`BlobportConfig::missing_required`].

use crate::config::{secret_string, SecretString};
use cron::Schedule;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Host environment variable holding the MongoDB connection string
pub const ENV_SOURCE_CONNECTION_STRING: &str = "MongoDBAtlasConnectionString";
/// Host environment variable holding the source database name
pub const ENV_SOURCE_DATABASE: &str = "DatabaseName";
/// Host environment variable holding the source collection name
pub const ENV_SOURCE_COLLECTION: &str = "CollectionName";
/// Host environment variable holding the Blob Storage connection string
pub const ENV_SINK_CONNECTION_STRING: &str = "AzureBlobStorageConnectionString";
/// Host environment variable holding the destination container name
pub const ENV_SINK_CONTAINER: &str = "BlobContainerName";

/// Main Blobport configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlobportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Source store (MongoDB) settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Sink store (Azure Blob Storage) settings
    #[serde(default)]
    pub sink: SinkConfig,

    /// Export invocation settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Timer trigger settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BlobportConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid. Missing
    /// required values are reported together in a single message.
    pub fn validate(&self) -> Result<(), String> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(format!(
                "Missing required configuration values: {}",
                missing.join(", ")
            ));
        }

        self.application.validate()?;
        self.source.validate()?;
        self.sink.validate()?;
        self.export.validate()?;
        self.schedule.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Lists the required values that are absent, by host environment name
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = self.source.missing_required();
        missing.extend(self.sink.missing_required());
        missing
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// MongoDB source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// MongoDB connection string (`mongodb://` or `mongodb+srv://`)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default = "empty_secret")]
    pub connection_string: SecretString,

    /// Database to read from
    #[serde(default)]
    pub database_name: String,

    /// Collection exported on every invocation
    #[serde(default)]
    pub collection_name: String,

    /// Server selection timeout in milliseconds
    #[serde(default = "default_server_selection_timeout_ms")]
    pub server_selection_timeout_ms: u64,

    /// Connection establishment timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl SourceConfig {
    /// Lists absent required values by host environment name
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.connection_string.expose_secret().trim().is_empty() {
            missing.push(ENV_SOURCE_CONNECTION_STRING);
        }
        if self.database_name.trim().is_empty() {
            missing.push(ENV_SOURCE_DATABASE);
        }
        if self.collection_name.trim().is_empty() {
            missing.push(ENV_SOURCE_COLLECTION);
        }
        missing
    }

    /// Server selection timeout as a Duration
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn validate(&self) -> Result<(), String> {
        let conn_str = self.connection_string.expose_secret();

        if !conn_str.starts_with("mongodb://") && !conn_str.starts_with("mongodb+srv://") {
            return Err(
                "source.connection_string must start with mongodb:// or mongodb+srv://"
                    .to_string(),
            );
        }

        if self.server_selection_timeout_ms == 0 {
            return Err("source.server_selection_timeout_ms must be > 0".to_string());
        }

        if self.connect_timeout_ms == 0 {
            return Err("source.connect_timeout_ms must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            connection_string: empty_secret(),
            database_name: String::new(),
            collection_name: String::new(),
            server_selection_timeout_ms: default_server_selection_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// How the sink authenticates against Blob Storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SinkAuth {
    /// Account key or SAS token taken from the connection string
    #[default]
    ConnectionString,
    /// Azure AD client credentials; the connection string only supplies the endpoint
    ServicePrincipal,
}

/// Azure Blob Storage sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Storage connection string
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default = "empty_secret")]
    pub connection_string: SecretString,

    /// Destination container; must already exist
    #[serde(default)]
    pub container_name: String,

    /// Authentication mode
    #[serde(default)]
    pub auth: SinkAuth,

    /// Azure AD tenant ID (service_principal auth)
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Azure AD client ID (service_principal auth)
    #[serde(default)]
    pub client_id: Option<String>,

    /// Azure AD client secret (service_principal auth)
    #[serde(default)]
    pub client_secret: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Payloads above this size are uploaded as staged blocks
    #[serde(default = "default_block_size_bytes")]
    pub block_size_bytes: usize,
}

impl SinkConfig {
    /// Lists absent required values by host environment name
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.connection_string.expose_secret().trim().is_empty() {
            missing.push(ENV_SINK_CONNECTION_STRING);
        }
        if self.container_name.trim().is_empty() {
            missing.push(ENV_SINK_CONTAINER);
        }
        missing
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate(&self) -> Result<(), String> {
        // Blob container naming rules: 3-63 chars, lowercase letters, digits and
        // single hyphens, starting and ending with a letter or digit.
        let name = self.container_name.as_str();
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !(3..=63).contains(&name.len())
            || !valid_chars
            || name.starts_with('-')
            || name.ends_with('-')
            || name.contains("--")
        {
            return Err(format!(
                "sink.container_name '{name}' is not a valid Blob Storage container name"
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err("sink.request_timeout_seconds must be > 0".to_string());
        }

        // Put Block accepts at most 4000 MiB per block
        if self.block_size_bytes == 0 || self.block_size_bytes > 4000 * 1024 * 1024 {
            return Err(format!(
                "sink.block_size_bytes must be between 1 and 4194304000, got {}",
                self.block_size_bytes
            ));
        }

        if self.auth == SinkAuth::ServicePrincipal {
            if self.tenant_id.as_deref().unwrap_or("").is_empty() {
                return Err(
                    "sink.tenant_id is required when sink.auth is 'service_principal'".to_string(),
                );
            }
            if self.client_id.as_deref().unwrap_or("").is_empty() {
                return Err(
                    "sink.client_id is required when sink.auth is 'service_principal'".to_string(),
                );
            }
            if self
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().is_empty())
                .unwrap_or(true)
            {
                return Err(
                    "sink.client_secret is required when sink.auth is 'service_principal'"
                        .to_string(),
                );
            }
        }

        Ok(())
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            connection_string: empty_secret(),
            container_name: String::new(),
            auth: SinkAuth::default(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            request_timeout_seconds: default_request_timeout_seconds(),
            block_size_bytes: default_block_size_bytes(),
        }
    }
}

/// Export invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Overall deadline for one invocation in seconds (unbounded when absent)
    ///
    /// Source release still runs after the deadline fires.
    #[serde(default)]
    pub deadline_seconds: Option<u64>,
}

impl ExportConfig {
    /// Deadline as a Duration
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<(), String> {
        if self.deadline_seconds == Some(0) {
            return Err("export.deadline_seconds must be > 0 when set".to_string());
        }
        Ok(())
    }
}

/// Timer trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Six-field cron expression (seconds resolution), evaluated in UTC
    #[serde(default = "default_cron")]
    pub cron: String,

    /// Fire one invocation immediately when the scheduler starts
    #[serde(default)]
    pub run_on_start: bool,

    /// Maximum time to wait for in-flight invocations on shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl ScheduleConfig {
    /// Parses the cron expression
    pub fn parsed(&self) -> Result<Schedule, String> {
        Schedule::from_str(&self.cron)
            .map_err(|e| format!("Invalid schedule.cron '{}': {}", self.cron, e))
    }

    fn validate(&self) -> Result<(), String> {
        self.parsed()?;
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            run_on_start: false,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn empty_secret() -> SecretString {
    secret_string(String::new())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_server_selection_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_seconds() -> u64 {
    60
}

fn default_block_size_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_cron() -> String {
    "0 */1 * * * *".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_local_path() -> String {
    "/var/log/blobport".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
