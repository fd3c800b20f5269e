//! Export pipeline - one invocation from source read to upload
//!
//! Steps run strictly in sequence and each one is gated on the previous:
//! configuration check, source connect, fetch, serialize, sink connect,
//! container check, upload. Acquired connections are released on every exit
//! path, including an expired deadline.

use crate::adapters::lifecycle::Scoped;
use crate::adapters::sink::{BlobSinkConnector, SinkClient, SinkConnector};
use crate::adapters::source::{MongoSourceConnector, SourceConnection, SourceConnector};
use crate::config::BlobportConfig;
use crate::core::export::report::{ExportOutcome, ExportReport};
use crate::core::transform::{columns_from_first, serialize_records};
use crate::domain::artifact::invocation_timestamp;
use crate::domain::{ArtifactName, ExportError, ExportResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Runs export invocations against a source and a sink
///
/// The pipeline holds no per-invocation state; concurrent calls to
/// [`ExportPipeline::run_export`] are independent.
pub struct ExportPipeline {
    config: BlobportConfig,
    source: Arc<dyn SourceConnector>,
    sink: Arc<dyn SinkConnector>,
}

impl ExportPipeline {
    /// Create a pipeline with explicit store connectors
    pub fn new(
        config: &BlobportConfig,
        source: Arc<dyn SourceConnector>,
        sink: Arc<dyn SinkConnector>,
    ) -> Self {
        Self {
            config: config.clone(),
            source,
            sink,
        }
    }

    /// Create a pipeline reading from MongoDB and writing to Azure Blob Storage
    pub fn from_config(config: &BlobportConfig) -> Self {
        Self::new(
            config,
            Arc::new(MongoSourceConnector::new()),
            Arc::new(BlobSinkConnector::new()),
        )
    }

    /// Run one export invocation
    ///
    /// `timestamp` is the invocation time and names the uploaded artifact.
    /// Never fails: every error is logged and reported in the returned
    /// [`ExportReport`].
    pub async fn run_export(&self, timestamp: DateTime<Utc>) -> ExportReport {
        let invocation_id = Uuid::new_v4();
        let timestamp_text = invocation_timestamp(&timestamp);
        let span = tracing::info_span!(
            "export",
            invocation_id = %invocation_id,
            timestamp = %timestamp_text
        );

        async move {
            let start_time = Instant::now();
            tracing::info!("Export invocation started");

            let mut release_errors = Vec::new();
            let outcome = self.execute(&timestamp, &mut release_errors).await;

            let mut report = ExportReport::new(invocation_id, timestamp_text, outcome)
                .with_duration(start_time.elapsed());
            for error in release_errors {
                report.add_release_error(error);
            }
            report.log_report();
            report
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        timestamp: &DateTime<Utc>,
        release_errors: &mut Vec<ExportError>,
    ) -> ExportOutcome {
        if let Err(e) = self.check_configuration() {
            return ExportOutcome::Failed(e);
        }

        // Acquired connections are parked here so they outlive an expired deadline
        let mut source: Option<Scoped<dyn SourceConnection>> = None;
        let mut sink: Option<Scoped<dyn SinkClient>> = None;

        let steps = self.connect_and_export(&mut source, &mut sink, timestamp);
        let result = match self.config.export.deadline() {
            Some(deadline) => match tokio::time::timeout(deadline, steps).await {
                Ok(result) => result,
                Err(_) => Err(ExportError::DeadlineExceeded(deadline.as_secs())),
            },
            None => steps.await,
        };

        // Released in reverse order of acquisition
        if let Some(mut sink) = sink {
            release_errors.extend(sink.release().await);
        }
        if let Some(mut source) = source {
            release_errors.extend(source.release().await);
        }

        match result {
            Ok(outcome) => outcome,
            Err(e) => ExportOutcome::Failed(e),
        }
    }

    async fn connect_and_export(
        &self,
        source: &mut Option<Scoped<dyn SourceConnection>>,
        sink: &mut Option<Scoped<dyn SinkClient>>,
        timestamp: &DateTime<Utc>,
    ) -> ExportResult<ExportOutcome> {
        tracing::info!(
            database = %self.config.source.database_name,
            collection = %self.config.source.collection_name,
            "Connecting to source store"
        );
        let connection = self.source.connect(&self.config.source).await?;
        let source = source.insert(Scoped::new("source", connection));

        self.export_from(source.get(), sink, timestamp).await
    }

    /// Fetch through upload; the sink client is parked in `sink` so the caller can release it
    async fn export_from(
        &self,
        source: &dyn SourceConnection,
        sink: &mut Option<Scoped<dyn SinkClient>>,
        timestamp: &DateTime<Utc>,
    ) -> ExportResult<ExportOutcome> {
        let records = source
            .fetch_all(
                &self.config.source.database_name,
                &self.config.source.collection_name,
            )
            .await?;
        tracing::info!(document_count = records.len(), "Fetched documents");

        if records.is_empty() {
            return Ok(ExportOutcome::NothingToExport);
        }

        let columns = columns_from_first(&records);
        let payload = serialize_records(&records, &columns)?;
        let document_count = records.len();
        drop(records);
        tracing::info!(
            columns = columns.len(),
            bytes = payload.len(),
            "Converted documents to CSV"
        );

        let client = self.sink.connect(&self.config.sink).await?;
        let client = sink.insert(Scoped::new("sink", client));

        let container = &self.config.sink.container_name;
        if !client.get().container_exists(container).await? {
            return Err(ExportError::DestinationMissing(container.clone()));
        }

        let artifact = ArtifactName::for_invocation(timestamp);
        let bytes = payload.len();
        tracing::info!(
            artifact = %artifact,
            container = %container,
            bytes,
            "Uploading CSV"
        );
        client
            .get()
            .upload(container, &artifact, payload.into_bytes())
            .await?;

        Ok(ExportOutcome::Exported {
            artifact,
            document_count,
            bytes,
        })
    }

    fn check_configuration(&self) -> ExportResult<()> {
        let missing = self.config.missing_required();
        if !missing.is_empty() {
            tracing::error!(missing = ?missing, "Missing required configuration values");
        }

        self.config.validate().map_err(|e| {
            tracing::error!(error = %e, "Configuration rejected");
            ExportError::Configuration(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{events, Journal, MemorySink, MemorySource};
    use crate::config::secret_string;
    use chrono::TimeZone;
    use mongodb::bson::doc;

    fn config() -> BlobportConfig {
        let mut config = BlobportConfig::default();
        config.source.connection_string = secret_string("mongodb://localhost:27017".to_string());
        config.source.database_name = "shop".to_string();
        config.source.collection_name = "orders".to_string();
        config.sink.connection_string = secret_string("UseDevelopmentStorage=true".to_string());
        config.sink.container_name = "exports".to_string();
        config
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_exports_collection() {
        let journal = Journal::new();
        let source = MemorySource::new(vec![doc! { "a": 1, "b": 2 }, doc! { "a": 3, "b": 4 }])
            .with_journal(journal.clone());
        let sink = MemorySink::new()
            .with_container("exports")
            .with_journal(journal.clone());
        let pipeline =
            ExportPipeline::new(&config(), Arc::new(source.clone()), Arc::new(sink.clone()));

        let report = pipeline.run_export(timestamp()).await;

        let artifact = report.artifact().expect("artifact expected").as_str().to_string();
        assert_eq!(artifact, "data-export-2025-03-01T12:00:00.000Z.csv");
        assert_eq!(sink.blob("exports", &artifact), Some(b"a,b\n1,2\n3,4\n".to_vec()));
        assert_eq!(
            source.fetched_from(),
            Some(("shop".to_string(), "orders".to_string()))
        );
        assert_eq!(
            journal.events(),
            vec![
                events::SOURCE_CONNECT,
                events::SOURCE_FETCH,
                events::SINK_CONNECT,
                events::SINK_CONTAINER_EXISTS,
                events::SINK_UPLOAD,
                events::SINK_RELEASE,
                events::SOURCE_RELEASE,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_configuration_makes_no_remote_calls() {
        let journal = Journal::new();
        let mut config = config();
        config.sink.container_name.clear();
        let pipeline = ExportPipeline::new(
            &config,
            Arc::new(MemorySource::new(vec![doc! { "a": 1 }]).with_journal(journal.clone())),
            Arc::new(MemorySink::new().with_journal(journal.clone())),
        );

        let report = pipeline.run_export(timestamp()).await;

        let err = report.error().expect("configuration error expected");
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("BlobContainerName"));
        assert!(journal.events().is_empty());
    }
}
