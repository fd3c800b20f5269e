//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{
    BlobportConfig, ENV_SINK_CONNECTION_STRING, ENV_SINK_CONTAINER, ENV_SOURCE_COLLECTION,
    ENV_SOURCE_CONNECTION_STRING, ENV_SOURCE_DATABASE,
};
use super::secret::secret_string;
use crate::domain::errors::BlobportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from an optional TOML file and the environment
///
/// This function:
/// 1. Reads the TOML file when a path is given (defaults otherwise)
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into BlobportConfig
/// 4. Applies the host variables (`MongoDBAtlasConnectionString`, `DatabaseName`,
///    `CollectionName`, `AzureBlobStorageConnectionString`, `BlobContainerName`)
/// 5. Applies `BLOBPORT_*` overrides for tunables
/// 6. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - The given file cannot be read
/// - TOML parsing fails
/// - A `${VAR}` placeholder references an unset variable
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use blobport::config::loader::load_config;
///
/// let config = load_config(Some("blobport.toml")).expect("Failed to load config");
/// ```
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<BlobportConfig> {
    let config = read_config(path)?;

    config.validate().map_err(|e| {
        BlobportError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Same as [`load_config`] without the final validation step
///
/// The scheduler uses this so that an invocation, not start-up, reports absent
/// connection values as a configuration outcome.
pub fn read_config<P: AsRef<Path>>(path: Option<P>) -> Result<BlobportConfig> {
    let mut config = match path {
        Some(path) => parse_file(path.as_ref())?,
        None => BlobportConfig::default(),
    };

    apply_host_env(&mut config);
    apply_env_overrides(&mut config)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<BlobportConfig> {
    if !path.exists() {
        return Err(BlobportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BlobportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    toml::from_str(&contents)
        .map_err(|e| BlobportError::Configuration(format!("Failed to parse TOML: {}", e)))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(BlobportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies the five connection variables the hosting runtime provides
///
/// These take precedence over the file. Empty values are ignored so an unset
/// app setting does not blank out a file value.
fn apply_host_env(config: &mut BlobportConfig) {
    if let Some(val) = non_empty_var(ENV_SOURCE_CONNECTION_STRING) {
        config.source.connection_string = secret_string(val);
    }
    if let Some(val) = non_empty_var(ENV_SOURCE_DATABASE) {
        config.source.database_name = val;
    }
    if let Some(val) = non_empty_var(ENV_SOURCE_COLLECTION) {
        config.source.collection_name = val;
    }
    if let Some(val) = non_empty_var(ENV_SINK_CONNECTION_STRING) {
        config.sink.connection_string = secret_string(val);
    }
    if let Some(val) = non_empty_var(ENV_SINK_CONTAINER) {
        config.sink.container_name = val;
    }
}

/// Applies environment variable overrides using BLOBPORT_* prefix
///
/// Environment variables follow the pattern: BLOBPORT_<SECTION>_<KEY>
/// For example: BLOBPORT_SCHEDULE_CRON, BLOBPORT_EXPORT_DEADLINE_SECONDS
fn apply_env_overrides(config: &mut BlobportConfig) -> Result<()> {
    if let Ok(val) = std::env::var("BLOBPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("BLOBPORT_SOURCE_SERVER_SELECTION_TIMEOUT_MS") {
        config.source.server_selection_timeout_ms = parse_override(
            "BLOBPORT_SOURCE_SERVER_SELECTION_TIMEOUT_MS",
            &val,
        )?;
    }
    if let Ok(val) = std::env::var("BLOBPORT_SOURCE_CONNECT_TIMEOUT_MS") {
        config.source.connect_timeout_ms =
            parse_override("BLOBPORT_SOURCE_CONNECT_TIMEOUT_MS", &val)?;
    }

    if let Ok(val) = std::env::var("BLOBPORT_SINK_REQUEST_TIMEOUT_SECONDS") {
        config.sink.request_timeout_seconds =
            parse_override("BLOBPORT_SINK_REQUEST_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("BLOBPORT_SINK_CLIENT_SECRET") {
        config.sink.client_secret = Some(secret_string(val));
    }

    if let Ok(val) = std::env::var("BLOBPORT_EXPORT_DEADLINE_SECONDS") {
        config.export.deadline_seconds =
            Some(parse_override("BLOBPORT_EXPORT_DEADLINE_SECONDS", &val)?);
    }

    if let Ok(val) = std::env::var("BLOBPORT_SCHEDULE_CRON") {
        config.schedule.cron = val;
    }
    if let Ok(val) = std::env::var("BLOBPORT_SCHEDULE_RUN_ON_START") {
        config.schedule.run_on_start = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("BLOBPORT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("BLOBPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        BlobportError::Configuration(format!("Invalid value '{}' for {}", value, name))
    })
}
