//! Schedule command implementation
//!
//! This module implements the `schedule` command: the long-running timer
//! trigger that starts one export invocation per cron fire time.

use crate::config::BlobportConfig;
use crate::core::export::ExportPipeline;
use crate::core::schedule::ExportScheduler;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the schedule command
#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Override the six-field cron expression (seconds resolution, UTC)
    #[arg(long)]
    pub cron: Option<String>,

    /// Run one export immediately before waiting for the first tick
    #[arg(long)]
    pub run_on_start: bool,
}

impl ScheduleArgs {
    /// Execute the schedule command
    ///
    /// Runs until a shutdown signal arrives. Individual invocation failures are
    /// logged and do not stop the scheduler.
    pub async fn execute(
        &self,
        mut config: BlobportConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting schedule command");

        if let Some(cron) = &self.cron {
            tracing::info!(cron = %cron, "Overriding schedule from CLI");
            config.schedule.cron = cron.clone();
        }
        if self.run_on_start {
            config.schedule.run_on_start = true;
        }

        let missing = config.missing_required();
        if !missing.is_empty() {
            // Each invocation will report this as a configuration outcome
            tracing::warn!(missing = ?missing, "Required configuration values are absent");
        }

        let pipeline = Arc::new(ExportPipeline::from_config(&config));
        let scheduler = match ExportScheduler::new(&config.schedule, pipeline) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create scheduler");
                eprintln!("Failed to start scheduler: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("⏱️  Exporting on schedule '{}' (UTC)", config.schedule.cron);
        println!("   Press Ctrl+C to stop");
        println!();

        let stats = scheduler.run(shutdown_signal).await;

        println!();
        println!("📊 Scheduler Summary:");
        println!("  Invocations: {}", stats.fired);
        println!("  Succeeded: {}", stats.succeeded);
        println!("  Failed: {}", stats.failed);
        println!("  Aborted: {}", stats.aborted);
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_cron_exits_with_configuration_code() {
        let args = ScheduleArgs {
            cron: Some("every minute".to_string()),
            run_on_start: false,
        };
        let (_tx, rx) = watch::channel(false);
        let code = args.execute(BlobportConfig::default(), rx).await.unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_stops_when_shutdown_already_requested() {
        let args = ScheduleArgs::default();
        let (_tx, rx) = watch::channel(true);
        let code = args.execute(BlobportConfig::default(), rx).await.unwrap();
        assert_eq!(code, 0);
    }
}
