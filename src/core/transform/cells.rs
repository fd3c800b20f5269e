//! BSON value to CSV cell text

use chrono::{DateTime, SecondsFormat};
use mongodb::bson::Bson;

/// Renders one field as cell text
///
/// `None` (key absent), `Null` and `Undefined` become an empty cell.
/// Scalars use their plain text form; documents, arrays and the remaining BSON
/// types become compact relaxed Extended JSON.
pub fn render_cell(value: Option<&Bson>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match value {
        Bson::Null | Bson::Undefined => String::new(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(f) => render_double(*f),
        Bson::Decimal128(d) => d.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::DateTime(dt) => render_datetime(dt),
        other => render_extended_json(other),
    }
}

fn render_double(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else {
        f.to_string()
    }
}

fn render_datetime(dt: &mongodb::bson::DateTime) -> String {
    match DateTime::from_timestamp_millis(dt.timestamp_millis()) {
        Some(utc) => utc.to_rfc3339_opts(SecondsFormat::Millis, true),
        // Outside chrono's range
        None => dt.timestamp_millis().to_string(),
    }
}

fn render_extended_json(value: &Bson) -> String {
    serde_json::to_string(&value.clone().into_relaxed_extjson()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId, Binary};
    use test_case::test_case;

    #[test_case(Bson::String("plain".into()), "plain" ; "string")]
    #[test_case(Bson::Int32(42), "42" ; "int32")]
    #[test_case(Bson::Int64(-7), "-7" ; "int64")]
    #[test_case(Bson::Double(2.5), "2.5" ; "double")]
    #[test_case(Bson::Double(3.0), "3" ; "whole double")]
    #[test_case(Bson::Double(f64::NAN), "NaN" ; "nan")]
    #[test_case(Bson::Double(f64::NEG_INFINITY), "-Infinity" ; "negative infinity")]
    #[test_case(Bson::Boolean(true), "true" ; "boolean")]
    #[test_case(Bson::Null, "" ; "null")]
    #[test_case(Bson::Undefined, "" ; "undefined")]
    fn test_scalar_cells(value: Bson, expected: &str) {
        assert_eq!(render_cell(Some(&value)), expected);
    }

    #[test]
    fn test_missing_key_is_empty() {
        assert_eq!(render_cell(None), "");
    }

    #[test]
    fn test_object_id_is_hex() {
        let oid = ObjectId::parse_str("65f0a1b2c3d4e5f6a7b8c9d0").unwrap();
        assert_eq!(
            render_cell(Some(&Bson::ObjectId(oid))),
            "65f0a1b2c3d4e5f6a7b8c9d0"
        );
    }

    #[test]
    fn test_datetime_has_millis_and_z() {
        let dt = mongodb::bson::DateTime::from_millis(1_740_830_400_000);
        assert_eq!(
            render_cell(Some(&Bson::DateTime(dt))),
            "2025-03-01T12:00:00.000Z"
        );
    }

    #[test]
    fn test_nested_values_are_compact_json() {
        let nested = Bson::Document(doc! { "city": "Oslo", "zip": 150 });
        assert_eq!(render_cell(Some(&nested)), r#"{"city":"Oslo","zip":150}"#);

        let array = Bson::Array(vec![Bson::Int32(1), Bson::String("two".into())]);
        assert_eq!(render_cell(Some(&array)), r#"[1,"two"]"#);
    }

    #[test]
    fn test_binary_is_extended_json() {
        let binary = Bson::Binary(Binary {
            subtype: mongodb::bson::spec::BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        });
        let cell = render_cell(Some(&binary));
        assert!(cell.starts_with(r#"{"$binary""#));
    }
}
