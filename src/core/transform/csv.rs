//! Record batch to CSV serialization
//!
//! The column list is derived once and passed in explicitly, so the serializer
//! itself is a pure function of its inputs.

use super::cells::render_cell;
use crate::domain::{ExportError, ExportResult, Record};

/// Column list taken from the first record's keys, in their stored order
///
/// Keys that only appear in later records are not exported. An empty batch
/// yields an empty list.
pub fn columns_from_first(records: &[Record]) -> Vec<String> {
    records
        .first()
        .map(|record| record.keys().cloned().collect())
        .unwrap_or_default()
}

/// Serializes `records` as CSV with a header row of `columns`
///
/// Each record becomes one row with its cells in column order; keys missing
/// from a record produce empty cells and keys not in `columns` are dropped.
/// Rows end with `\n` and fields are quoted only when needed.
///
/// # Errors
///
/// Returns `Serialization` for an empty batch, an empty column list, or a
/// writer failure.
///
/// # Examples
///
/// ```rust
/// use blobport::core::transform::csv::{columns_from_first, serialize_records};
/// use mongodb::bson::doc;
///
/// let records = vec![doc! { "a": 1, "b": "x" }, doc! { "a": 2 }];
/// let columns = columns_from_first(&records);
/// let csv = serialize_records(&records, &columns).unwrap();
/// assert_eq!(csv, "a,b\n1,x\n2,\n");
/// ```
pub fn serialize_records(records: &[Record], columns: &[String]) -> ExportResult<String> {
    if records.is_empty() {
        return Err(ExportError::Serialization("No records to serialize".to_string()));
    }
    if columns.is_empty() {
        return Err(ExportError::Serialization("Column list is empty".to_string()));
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(columns)
        .map_err(|e| ExportError::Serialization(format!("Failed to write header: {e}")))?;

    for (index, record) in records.iter().enumerate() {
        let row: Vec<String> = columns
            .iter()
            .map(|column| render_cell(record.get(column)))
            .collect();
        writer.write_record(&row).map_err(|e| {
            ExportError::Serialization(format!("Failed to write record {index}: {e}"))
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(format!("Failed to flush CSV writer: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|e| ExportError::Serialization(format!("CSV output is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExportErrorKind;
    use mongodb::bson::doc;

    #[test]
    fn test_header_follows_first_record_order() {
        let records = vec![
            doc! { "zeta": 1, "alpha": 2, "mid": 3 },
            doc! { "alpha": 5, "mid": 6, "zeta": 4 },
        ];
        let columns = columns_from_first(&records);
        assert_eq!(columns, vec!["zeta", "alpha", "mid"]);

        let csv = serialize_records(&records, &columns).unwrap();
        assert_eq!(csv, "zeta,alpha,mid\n1,2,3\n4,5,6\n");
    }

    #[test]
    fn test_extra_keys_are_dropped() {
        let records = vec![doc! { "a": 1 }, doc! { "a": 2, "b": "extra" }];
        let columns = columns_from_first(&records);
        let csv = serialize_records(&records, &columns).unwrap();
        assert_eq!(csv, "a\n1\n2\n");
    }

    #[test]
    fn test_quoting() {
        let records = vec![doc! { "note": "says \"hi\", twice", "line": "a\nb" }];
        let columns = columns_from_first(&records);
        let csv = serialize_records(&records, &columns).unwrap();
        assert_eq!(csv, "note,line\n\"says \"\"hi\"\", twice\",\"a\nb\"\n");
    }

    #[test]
    fn test_empty_inputs_are_serialization_errors() {
        let err = serialize_records(&[], &["a".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ExportErrorKind::Serialization);

        let err = serialize_records(&[doc! { "a": 1 }], &[]).unwrap_err();
        assert_eq!(err.kind(), ExportErrorKind::Serialization);
    }

    #[test]
    fn test_columns_from_empty_batch() {
        assert!(columns_from_first(&[]).is_empty());
    }
}
