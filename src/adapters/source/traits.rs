//! Source store abstraction traits
//!
//! The pipeline only needs three capabilities from a document store: connect,
//! read a whole collection, and release the connection.

use crate::adapters::lifecycle::Releasable;
use crate::config::SourceConfig;
use crate::domain::{ExportBatch, ExportResult};
use async_trait::async_trait;

/// Opens connections to a document store
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Acquires a connection within the configured selection/connect timeouts
    ///
    /// A connector that partially established a connection before failing must
    /// release it before returning the error.
    ///
    /// # Errors
    ///
    /// `SourceTimeout` when the timeouts elapse, `SourceConnect` or
    /// `SourceNetwork` for other failures.
    async fn connect(&self, config: &SourceConfig) -> ExportResult<Box<dyn SourceConnection>>;
}

/// An open connection to a document store
#[async_trait]
pub trait SourceConnection: Releasable {
    /// Reads every document of `database.collection`
    ///
    /// No filter, projection or sort is applied; the whole result set is
    /// collected in memory in cursor order.
    async fn fetch_all(&self, database: &str, collection: &str) -> ExportResult<ExportBatch>;
}
