//! Timer trigger for export invocations
//!
//! [`ExportScheduler`] evaluates a six-field cron expression in UTC and starts
//! one pipeline invocation per fire time. Invocations run as independent tasks;
//! a slow one never delays the next tick.

use crate::config::ScheduleConfig;
use crate::core::export::{ExportPipeline, ExportReport};
use crate::domain::{BlobportError, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

/// Counters over the lifetime of a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Invocations started
    pub fired: usize,
    /// Invocations that uploaded an artifact or found nothing to export
    pub succeeded: usize,
    /// Invocations that reported a failure
    pub failed: usize,
    /// Invocations that panicked or were aborted at shutdown
    pub aborted: usize,
}

impl SchedulerStats {
    fn record(&mut self, joined: std::result::Result<ExportReport, JoinError>) {
        match joined {
            Ok(report) if report.is_success() => self.succeeded += 1,
            Ok(_) => self.failed += 1,
            Err(e) => {
                if e.is_panic() {
                    tracing::error!(error = %e, "Export invocation panicked");
                }
                self.aborted += 1;
            }
        }
    }
}

/// Cron-driven runner of export invocations
pub struct ExportScheduler {
    schedule: Schedule,
    pipeline: Arc<ExportPipeline>,
    run_on_start: bool,
    shutdown_timeout: Duration,
}

impl ExportScheduler {
    /// Create a scheduler from its configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the cron expression does not parse
    pub fn new(config: &ScheduleConfig, pipeline: Arc<ExportPipeline>) -> Result<Self> {
        let schedule = config.parsed().map_err(BlobportError::Schedule)?;

        Ok(Self {
            schedule,
            pipeline,
            run_on_start: config.run_on_start,
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        })
    }

    /// First fire time strictly after `after`
    pub fn next_fire_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(after).next()
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    ///
    /// On shutdown no new invocation starts; in-flight ones get the configured
    /// grace period and are aborted afterwards.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SchedulerStats {
        let mut in_flight = JoinSet::new();
        let mut stats = SchedulerStats::default();

        tracing::info!(run_on_start = self.run_on_start, "Scheduler started");

        if self.run_on_start {
            self.fire(&mut in_flight, &mut stats);
        }

        let mut last_tick: Option<DateTime<Utc>> = None;

        loop {
            if *shutdown.borrow() {
                tracing::info!("Shutdown requested, no further invocations will start");
                break;
            }

            let now = Utc::now();
            // A tick never fires twice, even if the timer wakes before the wall clock reaches it
            let from = last_tick.map_or(now, |tick| tick.max(now));
            let Some(next) = self.next_fire_after(&from) else {
                tracing::warn!("Schedule has no upcoming fire times");
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::debug!(
                next_fire = %next,
                wait_ms = wait.as_millis() as u64,
                "Waiting for next trigger"
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_tick = Some(next);
                    self.fire(&mut in_flight, &mut stats);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::info!("Shutdown channel closed");
                        break;
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    stats.record(joined);
                }
            }
        }

        self.drain(in_flight, &mut stats).await;

        tracing::info!(
            fired = stats.fired,
            succeeded = stats.succeeded,
            failed = stats.failed,
            aborted = stats.aborted,
            "Scheduler stopped"
        );
        stats
    }

    fn fire(&self, in_flight: &mut JoinSet<ExportReport>, stats: &mut SchedulerStats) {
        let pipeline = Arc::clone(&self.pipeline);
        let timestamp = Utc::now();

        if !in_flight.is_empty() {
            tracing::warn!(
                in_flight = in_flight.len(),
                "Previous invocation still running, starting another"
            );
        }

        in_flight.spawn(async move { pipeline.run_export(timestamp).await });
        stats.fired += 1;
    }

    async fn drain(&self, mut in_flight: JoinSet<ExportReport>, stats: &mut SchedulerStats) {
        if in_flight.is_empty() {
            return;
        }

        tracing::info!(
            in_flight = in_flight.len(),
            timeout_secs = self.shutdown_timeout.as_secs(),
            "Waiting for in-flight invocations"
        );

        let finished = tokio::time::timeout(self.shutdown_timeout, async {
            while let Some(joined) = in_flight.join_next().await {
                stats.record(joined);
            }
        })
        .await;

        if finished.is_err() {
            tracing::warn!(
                remaining = in_flight.len(),
                "Shutdown timeout elapsed, aborting in-flight invocations"
            );
            in_flight.abort_all();
            while let Some(joined) = in_flight.join_next().await {
                stats.record(joined);
            }
        }
    }
}
