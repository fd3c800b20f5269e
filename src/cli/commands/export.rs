//! Export command implementation
//!
//! This module implements the `export` command, which runs a single export
//! invocation immediately and maps its outcome to the process exit code.

use crate::config::BlobportConfig;
use crate::core::export::{ExportOutcome, ExportPipeline};
use chrono::Utc;
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Override the invocation deadline in seconds
    #[arg(long, value_name = "SECONDS")]
    pub deadline_seconds: Option<u64>,
}

impl ExportArgs {
    /// Execute the export command
    ///
    /// Absent connection values are not rejected here; the pipeline reports
    /// them as a configuration outcome.
    pub async fn execute(&self, mut config: BlobportConfig) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        if let Some(deadline) = self.deadline_seconds {
            tracing::info!(deadline_seconds = deadline, "Overriding export deadline from CLI");
            config.export.deadline_seconds = Some(deadline);
        }

        let pipeline = ExportPipeline::from_config(&config);

        println!("🚀 Starting export...");
        println!();

        let report = pipeline.run_export(Utc::now()).await;

        println!("📊 Export Summary:");
        println!("  Invocation: {}", report.invocation_id);
        println!("  Timestamp: {}", report.timestamp);
        println!("  Outcome: {}", report.outcome.label());
        println!("  Duration: {:.2}s", report.duration.as_secs_f64());

        match &report.outcome {
            ExportOutcome::Exported {
                artifact,
                document_count,
                bytes,
            } => {
                println!("  Artifact: {}/{}", config.sink.container_name, artifact);
                println!("  Documents: {document_count}");
                println!("  Bytes: {bytes}");
                println!();
                println!("✅ Export completed successfully!");
            }
            ExportOutcome::NothingToExport => {
                println!();
                println!("✅ Collection is empty, nothing to export");
            }
            ExportOutcome::Failed(error) => {
                println!();
                println!("❌ Export failed ({})", error.kind());
                println!("   Error: {error}");
                println!("   Hint: {}", error.hint());
            }
        }

        if !report.release_errors.is_empty() {
            println!();
            println!("⚠️  Errors while releasing connections:");
            for error in &report.release_errors {
                println!("  - {error}");
            }
        }
        println!();

        Ok(report.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::exit_codes;

    #[test]
    fn test_export_args_defaults() {
        let args = ExportArgs::default();
        assert!(args.deadline_seconds.is_none());
    }

    #[tokio::test]
    async fn test_missing_configuration_exits_with_configuration_code() {
        let args = ExportArgs::default();
        let code = args.execute(BlobportConfig::default()).await.unwrap();
        assert_eq!(code, exit_codes::CONFIGURATION);
    }
}
