//! Configuration management for Blobport.
//!
//! # Overview
//!
//! Configuration is assembled once at process entry and passed explicitly into
//! the export pipeline. Sources, in increasing precedence:
//! - Serde defaults for every tunable
//! - An optional TOML file with `${VAR_NAME}` substitution
//! - The host variables `MongoDBAtlasConnectionString`, `DatabaseName`,
//!   `CollectionName`, `AzureBlobStorageConnectionString`, `BlobContainerName`
//! - `BLOBPORT_<SECTION>_<KEY>` overrides
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`SourceConfig`] - MongoDB connection and timeouts
//! - [`SinkConfig`] - Blob Storage connection, container and upload tuning
//! - [`ExportConfig`] - Invocation deadline
//! - [`ScheduleConfig`] - Cron trigger
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [source]
//! connection_string = "${MONGO_URI}"
//! database_name = "shop"
//! collection_name = "orders"
//!
//! [sink]
//! connection_string = "${STORAGE_CONNECTION_STRING}"
//! container_name = "exports"
//!
//! [schedule]
//! cron = "0 */1 * * * *"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, read_config};
pub use schema::{
    ApplicationConfig, BlobportConfig, ExportConfig, LoggingConfig, ScheduleConfig, SinkAuth,
    SinkConfig, SourceConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
