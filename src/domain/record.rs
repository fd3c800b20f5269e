//! Records fetched from the source store

use mongodb::bson::Document;

/// One schema-less document fetched from the source store
pub type Record = Document;

/// All records fetched by a single invocation, in cursor order
pub type ExportBatch = Vec<Record>;
