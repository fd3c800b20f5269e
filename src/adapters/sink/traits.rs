//! Sink store abstraction traits

use crate::adapters::lifecycle::Releasable;
use crate::config::SinkConfig;
use crate::domain::{ArtifactName, ExportResult};
use async_trait::async_trait;

/// Creates clients for an object store
#[async_trait]
pub trait SinkConnector: Send + Sync {
    /// Builds a client from the sink configuration
    ///
    /// # Errors
    ///
    /// `SinkConnect` when the connection string or credentials are unusable.
    async fn connect(&self, config: &SinkConfig) -> ExportResult<Box<dyn SinkClient>>;
}

/// A client for one object store account
#[async_trait]
pub trait SinkClient: Releasable {
    /// Reports whether `container` exists
    ///
    /// Containers are never created by the exporter.
    async fn container_exists(&self, container: &str) -> ExportResult<bool>;

    /// Writes `payload` as `name` in `container`, replacing any existing object
    async fn upload(
        &self,
        container: &str,
        name: &ArtifactName,
        payload: Vec<u8>,
    ) -> ExportResult<()>;
}
