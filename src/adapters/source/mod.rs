//! Source store adapters
//!
//! The export reads from a document store through [`SourceConnector`] and
//! [`SourceConnection`]. [`MongoSourceConnector`] is the production
//! implementation.

pub mod mongo;
pub mod traits;

pub use mongo::{MongoSourceConnection, MongoSourceConnector};
pub use traits::{SourceConnection, SourceConnector};
