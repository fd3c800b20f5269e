//! End-to-end tests of the export pipeline against a mock Blob Storage endpoint
//!
//! The source is in-memory; the sink is the real REST client talking to a
//! mockito server that plays the storage account.

use blobport::adapters::memory::MemorySource;
use blobport::adapters::sink::connection_string::{DEV_ACCOUNT_KEY, DEV_ACCOUNT_NAME};
use blobport::adapters::sink::BlobSinkConnector;
use blobport::config::{secret_string, BlobportConfig};
use blobport::core::export::{exit_codes, ExportPipeline};
use blobport::domain::ExportErrorKind;
use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};
use mongodb::bson::doc;
use std::sync::Arc;

fn config(server_url: &str) -> BlobportConfig {
    let mut config = BlobportConfig::default();
    config.source.connection_string = secret_string("mongodb://localhost:27017".to_string());
    config.source.database_name = "shop".to_string();
    config.source.collection_name = "orders".to_string();
    config.sink.connection_string = secret_string(format!(
        "BlobEndpoint={server_url}/{DEV_ACCOUNT_NAME};AccountName={DEV_ACCOUNT_NAME};AccountKey={DEV_ACCOUNT_KEY}"
    ));
    config.sink.container_name = "exports".to_string();
    config
}

fn pipeline(config: &BlobportConfig) -> ExportPipeline {
    let source = MemorySource::new(vec![
        doc! { "sku": "A-1", "qty": 3 },
        doc! { "sku": "B-2", "qty": 1 },
    ]);
    ExportPipeline::new(config, Arc::new(source), Arc::new(BlobSinkConnector::new()))
}

#[tokio::test]
async fn test_export_writes_csv_blob() {
    let mut server = Server::new_async().await;
    let exists = server
        .mock("HEAD", "/devstoreaccount1/exports")
        .match_query(Matcher::UrlEncoded("restype".into(), "container".into()))
        .with_status(200)
        .create_async()
        .await;
    let upload = server
        .mock(
            "PUT",
            "/devstoreaccount1/exports/data-export-2025-03-01T12:00:00.000Z.csv",
        )
        .match_header("x-ms-blob-type", "BlockBlob")
        .match_header("x-ms-version", "2021-08-06")
        .match_header(
            "authorization",
            Matcher::Regex("^SharedKey devstoreaccount1:".to_string()),
        )
        .match_body("sku,qty\nA-1,3\nB-2,1\n")
        .with_status(201)
        .create_async()
        .await;

    let timestamp = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let report = pipeline(&config(&server.url())).run_export(timestamp).await;

    assert!(report.is_success(), "unexpected outcome: {:?}", report.outcome);
    assert_eq!(
        report.artifact().unwrap().as_str(),
        "data-export-2025-03-01T12:00:00.000Z.csv"
    );
    exists.assert_async().await;
    upload.assert_async().await;
}

#[tokio::test]
async fn test_missing_container_never_uploads() {
    let mut server = Server::new_async().await;
    let exists = server
        .mock("HEAD", "/devstoreaccount1/exports")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("x-ms-error-code", "ContainerNotFound")
        .create_async()
        .await;
    let any_put = server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let report = pipeline(&config(&server.url()))
        .run_export(Utc::now())
        .await;

    assert_eq!(
        report.error().unwrap().kind(),
        ExportErrorKind::DestinationMissing
    );
    assert_eq!(report.exit_code(), exit_codes::DESTINATION_MISSING);
    exists.assert_async().await;
    any_put.assert_async().await;
}

#[tokio::test]
async fn test_throttled_upload_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("HEAD", "/devstoreaccount1/exports")
        .match_query(Matcher::Any)
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("PUT", Matcher::Any)
        .with_status(503)
        .with_header("x-ms-error-code", "ServerBusy")
        .create_async()
        .await;

    let report = pipeline(&config(&server.url()))
        .run_export(Utc::now())
        .await;

    let err = report.error().unwrap();
    assert_eq!(err.kind(), ExportErrorKind::SinkUpload);
    assert!(err.to_string().contains("ServerBusy"));
    assert_eq!(report.exit_code(), exit_codes::OTHER);
}

#[tokio::test]
async fn test_malformed_connection_string_is_sink_connect_error() {
    let mut config = config("http://127.0.0.1:1");
    config.sink.connection_string = secret_string("not a connection string".to_string());

    let report = pipeline(&config).run_export(Utc::now()).await;

    assert_eq!(report.error().unwrap().kind(), ExportErrorKind::SinkConnect);
}
