//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Blobport configuration without contacting either store.

use crate::config::secret::redact_connection_string;
use crate::config::{BlobportConfig, SinkAuth};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config: &BlobportConfig) -> anyhow::Result<i32> {
        tracing::info!("Validating configuration");

        println!("🔍 Validating configuration");
        println!();

        match config.validate() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!(
                    "  Source: {}",
                    redact_connection_string(config.source.connection_string.expose_secret())
                );
                println!("  Database: {}", config.source.database_name);
                println!("  Collection: {}", config.source.collection_name);
                println!(
                    "  Sink: {}",
                    redact_connection_string(config.sink.connection_string.expose_secret())
                );
                println!("  Container: {}", config.sink.container_name);
                let auth = match config.sink.auth {
                    SinkAuth::ConnectionString => "connection_string",
                    SinkAuth::ServicePrincipal => "service_principal",
                };
                println!("  Sink Auth: {auth}");
                println!("  Schedule: {}", config.schedule.cron);
                match config.export.deadline_seconds {
                    Some(secs) => println!("  Deadline: {secs}s"),
                    None => println!("  Deadline: none"),
                }
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2) // Configuration error exit code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[tokio::test]
    async fn test_missing_values_fail_validation() {
        let code = ValidateArgs {}
            .execute(&BlobportConfig::default())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_complete_configuration_is_valid() {
        let mut config = BlobportConfig::default();
        config.source.connection_string = secret_string("mongodb://localhost:27017".to_string());
        config.source.database_name = "shop".to_string();
        config.source.collection_name = "orders".to_string();
        config.sink.connection_string = secret_string("UseDevelopmentStorage=true".to_string());
        config.sink.container_name = "exports".to_string();

        let code = ValidateArgs {}.execute(&config).await.unwrap();
        assert_eq!(code, 0);
    }
}
