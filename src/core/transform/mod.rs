//! Data transformation logic
//!
//! Turns a batch of schema-less records into a rectangular CSV payload:
//!
//! - [`cells`] renders individual BSON values as cell text
//! - [`csv`] derives the column list and writes the header and rows

pub mod cells;
pub mod csv;

pub use self::csv::{columns_from_first, serialize_records};
pub use cells::render_cell;
