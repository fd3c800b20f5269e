//! Sink store adapters
//!
//! Exports are written through [`SinkConnector`] and [`SinkClient`].
//! [`BlobSinkConnector`] targets Azure Blob Storage.

pub mod auth;
pub mod blob;
pub mod connection_string;
pub mod traits;

pub use blob::{BlobSinkClient, BlobSinkConnector};
pub use connection_string::StorageConnection;
pub use traits::{SinkClient, SinkConnector};
