//! In-memory source and sink implementations
//!
//! Both stores share a [`Journal`] of adapter calls so callers can check the
//! order of operations. Every operation can be made to fail with an injected
//! error.

use crate::adapters::lifecycle::Releasable;
use crate::adapters::sink::{SinkClient, SinkConnector};
use crate::adapters::source::{SourceConnection, SourceConnector};
use crate::config::{SinkConfig, SourceConfig};
use crate::domain::{ArtifactName, ExportBatch, ExportError, ExportResult, Record};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Produces the error an operation fails with
pub type ErrorFactory = Arc<dyn Fn() -> ExportError + Send + Sync>;

/// Journal event names
pub mod events {
    pub const SOURCE_CONNECT: &str = "source.connect";
    pub const SOURCE_FETCH: &str = "source.fetch";
    pub const SOURCE_RELEASE: &str = "source.release";
    pub const SINK_CONNECT: &str = "sink.connect";
    pub const SINK_CONTAINER_EXISTS: &str = "sink.container_exists";
    pub const SINK_UPLOAD: &str = "sink.upload";
    pub const SINK_RELEASE: &str = "sink.release";
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered record of adapter calls
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    /// Creates an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: &'static str) {
        lock(&self.0).push(event);
    }

    /// All events in call order
    pub fn events(&self) -> Vec<&'static str> {
        lock(&self.0).clone()
    }

    /// Number of times `event` was recorded
    pub fn count(&self, event: &str) -> usize {
        lock(&self.0).iter().filter(|e| **e == event).count()
    }

    /// Whether `event` was recorded at least once
    pub fn contains(&self, event: &str) -> bool {
        self.count(event) > 0
    }
}

/// In-memory document store holding a single collection
#[derive(Clone, Default)]
pub struct MemorySource {
    records: Arc<Vec<Record>>,
    journal: Journal,
    fetched_from: Arc<Mutex<Option<(String, String)>>>,
    connect_error: Option<ErrorFactory>,
    fetch_error: Option<ErrorFactory>,
    release_error: Option<ErrorFactory>,
    connect_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
}

impl MemorySource {
    /// Creates a store returning `records` from every fetch
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(records),
            ..Self::default()
        }
    }

    /// Shares `journal` with this store
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Makes `connect` fail
    pub fn fail_connect(mut self, error: impl Fn() -> ExportError + Send + Sync + 'static) -> Self {
        self.connect_error = Some(Arc::new(error));
        self
    }

    /// Makes `fetch_all` fail
    pub fn fail_fetch(mut self, error: impl Fn() -> ExportError + Send + Sync + 'static) -> Self {
        self.fetch_error = Some(Arc::new(error));
        self
    }

    /// Makes `release` fail
    pub fn fail_release(mut self, error: impl Fn() -> ExportError + Send + Sync + 'static) -> Self {
        self.release_error = Some(Arc::new(error));
        self
    }

    /// Delays every connect by `delay`
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Delays every fetch by `delay`
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// The journal this store records into
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// The `(database, collection)` of the last fetch
    pub fn fetched_from(&self) -> Option<(String, String)> {
        lock(&self.fetched_from).clone()
    }
}

#[async_trait]
impl SourceConnector for MemorySource {
    async fn connect(&self, _config: &SourceConfig) -> ExportResult<Box<dyn SourceConnection>> {
        self.journal.record(events::SOURCE_CONNECT);
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.connect_error {
            return Err(error());
        }
        Ok(Box::new(MemorySourceConnection {
            store: self.clone(),
            released: false,
        }))
    }
}

/// Connection handed out by [`MemorySource`]
pub struct MemorySourceConnection {
    store: MemorySource,
    released: bool,
}

#[async_trait]
impl SourceConnection for MemorySourceConnection {
    async fn fetch_all(&self, database: &str, collection: &str) -> ExportResult<ExportBatch> {
        self.store.journal.record(events::SOURCE_FETCH);
        *lock(&self.store.fetched_from) = Some((database.to_string(), collection.to_string()));

        if let Some(delay) = self.store.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.store.fetch_error {
            return Err(error());
        }
        Ok(self.store.records.as_ref().clone())
    }
}

#[async_trait]
impl Releasable for MemorySourceConnection {
    async fn release(&mut self) -> ExportResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.store.journal.record(events::SOURCE_RELEASE);
        match &self.store.release_error {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

/// In-memory object store
#[derive(Clone, Default)]
pub struct MemorySink {
    containers: Arc<Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>>,
    journal: Journal,
    connect_error: Option<ErrorFactory>,
    exists_error: Option<ErrorFactory>,
    upload_error: Option<ErrorFactory>,
    release_error: Option<ErrorFactory>,
}

impl MemorySink {
    /// Creates a store with no containers
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty container
    pub fn with_container(self, name: &str) -> Self {
        lock(&self.containers).entry(name.to_string()).or_default();
        self
    }

    /// Shares `journal` with this store
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Makes `connect` fail
    pub fn fail_connect(mut self, error: impl Fn() -> ExportError + Send + Sync + 'static) -> Self {
        self.connect_error = Some(Arc::new(error));
        self
    }

    /// Makes `container_exists` fail
    pub fn fail_container_exists(
        mut self,
        error: impl Fn() -> ExportError + Send + Sync + 'static,
    ) -> Self {
        self.exists_error = Some(Arc::new(error));
        self
    }

    /// Makes `upload` fail
    pub fn fail_upload(mut self, error: impl Fn() -> ExportError + Send + Sync + 'static) -> Self {
        self.upload_error = Some(Arc::new(error));
        self
    }

    /// Makes `release` fail
    pub fn fail_release(mut self, error: impl Fn() -> ExportError + Send + Sync + 'static) -> Self {
        self.release_error = Some(Arc::new(error));
        self
    }

    /// The journal this store records into
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Contents of an uploaded object
    pub fn blob(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        lock(&self.containers)
            .get(container)
            .and_then(|blobs| blobs.get(name))
            .cloned()
    }

    /// Object names in `container`, sorted
    pub fn blob_names(&self, container: &str) -> Vec<String> {
        lock(&self.containers)
            .get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SinkConnector for MemorySink {
    async fn connect(&self, _config: &SinkConfig) -> ExportResult<Box<dyn SinkClient>> {
        self.journal.record(events::SINK_CONNECT);
        if let Some(error) = &self.connect_error {
            return Err(error());
        }
        Ok(Box::new(MemorySinkClient {
            store: self.clone(),
            released: false,
        }))
    }
}

/// Client handed out by [`MemorySink`]
pub struct MemorySinkClient {
    store: MemorySink,
    released: bool,
}

#[async_trait]
impl SinkClient for MemorySinkClient {
    async fn container_exists(&self, container: &str) -> ExportResult<bool> {
        self.store.journal.record(events::SINK_CONTAINER_EXISTS);
        if let Some(error) = &self.store.exists_error {
            return Err(error());
        }
        Ok(lock(&self.store.containers).contains_key(container))
    }

    async fn upload(
        &self,
        container: &str,
        name: &ArtifactName,
        payload: Vec<u8>,
    ) -> ExportResult<()> {
        self.store.journal.record(events::SINK_UPLOAD);
        if let Some(error) = &self.store.upload_error {
            return Err(error());
        }

        let mut containers = lock(&self.store.containers);
        let blobs = containers
            .get_mut(container)
            .ok_or_else(|| ExportError::SinkUpload(format!("ContainerNotFound: {container}")))?;
        blobs.insert(name.as_str().to_string(), payload);
        Ok(())
    }
}

#[async_trait]
impl Releasable for MemorySinkClient {
    async fn release(&mut self) -> ExportResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.store.journal.record(events::SINK_RELEASE);
        match &self.store.release_error {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_source_records_calls() {
        let source = MemorySource::new(vec![doc! { "a": 1 }]);
        let mut conn = source.connect(&SourceConfig::default()).await.unwrap();

        let records = conn.fetch_all("shop", "orders").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            source.fetched_from(),
            Some(("shop".to_string(), "orders".to_string()))
        );

        conn.release().await.unwrap();
        conn.release().await.unwrap();
        assert_eq!(
            source.journal().events(),
            vec![
                events::SOURCE_CONNECT,
                events::SOURCE_FETCH,
                events::SOURCE_RELEASE
            ]
        );
    }

    #[tokio::test]
    async fn test_sink_stores_blobs() {
        let sink = MemorySink::new().with_container("exports");
        let client = sink.connect(&SinkConfig::default()).await.unwrap();
        let name = ArtifactName::for_invocation(&chrono::Utc::now());

        assert!(client.container_exists("exports").await.unwrap());
        assert!(!client.container_exists("other").await.unwrap());

        client.upload("exports", &name, b"a\n".to_vec()).await.unwrap();
        assert_eq!(sink.blob("exports", name.as_str()), Some(b"a\n".to_vec()));
        assert_eq!(sink.blob_names("exports"), vec![name.as_str().to_string()]);

        assert!(client.upload("other", &name, Vec::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let source = MemorySource::new(Vec::new())
            .fail_connect(|| ExportError::SourceTimeout("no primary".to_string()));
        let err = match source.connect(&SourceConfig::default()).await {
            Ok(_) => panic!("connect should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, ExportError::SourceTimeout(_)));

        let sink = MemorySink::new()
            .fail_upload(|| ExportError::SinkUpload("throttled".to_string()));
        let client = sink.connect(&SinkConfig::default()).await.unwrap();
        let name = ArtifactName::for_invocation(&chrono::Utc::now());
        assert!(client.upload("exports", &name, Vec::new()).await.is_err());
    }
}
