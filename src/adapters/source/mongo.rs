//! MongoDB source adapter
//!
//! Reads whole collections with the official driver. Connections are verified
//! with a `ping` before they are handed to the pipeline, so server selection and
//! authentication problems surface as connect failures rather than query
//! failures.

use super::traits::{SourceConnection, SourceConnector};
use crate::adapters::lifecycle::Releasable;
use crate::config::SourceConfig;
use crate::domain::{ExportBatch, ExportError, ExportResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::ClientOptions;
use mongodb::Client;
use secrecy::ExposeSecret;

/// Application name reported to the server in the connection handshake
pub const APP_NAME: &str = "blobport";

/// Stage of the source interaction an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Connect,
    Query,
}

/// Connects to MongoDB using the driver's connection string parser
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoSourceConnector;

impl MongoSourceConnector {
    /// Creates a new connector
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceConnector for MongoSourceConnector {
    async fn connect(&self, config: &SourceConfig) -> ExportResult<Box<dyn SourceConnection>> {
        let uri: &str = config.connection_string.expose_secret();

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| classify(&e, Stage::Connect))?;
        options.server_selection_timeout = Some(config.server_selection_timeout());
        options.connect_timeout = Some(config.connect_timeout());
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options).map_err(|e| classify(&e, Stage::Connect))?;

        tracing::debug!(
            database = %config.database_name,
            server_selection_timeout_ms = config.server_selection_timeout_ms,
            "Verifying MongoDB connection"
        );

        // The driver connects lazily; ping forces server selection and auth now
        if let Err(e) = client
            .database(&config.database_name)
            .run_command(doc! { "ping": 1 })
            .await
        {
            client.shutdown().await;
            return Err(classify(&e, Stage::Connect));
        }

        tracing::info!("Connected to MongoDB");
        Ok(Box::new(MongoSourceConnection {
            client: Some(client),
        }))
    }
}

/// An open MongoDB client
pub struct MongoSourceConnection {
    client: Option<Client>,
}

impl MongoSourceConnection {
    fn client(&self) -> ExportResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| ExportError::SourceQuery("MongoDB client already closed".to_string()))
    }
}

#[async_trait]
impl SourceConnection for MongoSourceConnection {
    async fn fetch_all(&self, database: &str, collection: &str) -> ExportResult<ExportBatch> {
        let collection = self
            .client()?
            .database(database)
            .collection::<Document>(collection);

        let cursor = collection
            .find(doc! {})
            .await
            .map_err(|e| classify(&e, Stage::Query))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| classify(&e, Stage::Query))
    }
}

#[async_trait]
impl Releasable for MongoSourceConnection {
    async fn release(&mut self) -> ExportResult<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }
        Ok(())
    }
}

/// Maps a driver error onto the export taxonomy
///
/// Server selection and socket timeouts are timeouts; other socket failures are
/// network errors. Anything else is a connect failure while connecting and a
/// query failure afterwards.
pub(crate) fn classify(error: &MongoError, stage: Stage) -> ExportError {
    let message = error.to_string();

    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. } => ExportError::SourceTimeout(message),
        ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            ExportError::SourceTimeout(message)
        }
        ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. } => {
            ExportError::SourceNetwork(message)
        }
        ErrorKind::Authentication { .. }
        | ErrorKind::InvalidArgument { .. }
        | ErrorKind::DnsResolve { .. } => ExportError::SourceConnect(message),
        _ => match stage {
            Stage::Connect => ExportError::SourceConnect(message),
            Stage::Query => ExportError::SourceQuery(message),
        },
    }
}
