//! Azure Blob Storage sink adapter
//!
//! Talks to the Blob service REST API directly with reqwest. Small payloads
//! go up with a single Put Blob; larger ones are staged with Put Block and
//! committed with Put Block List.

use super::auth::SharedKeySigner;
use super::connection_string::StorageConnection;
use super::traits::{SinkClient, SinkConnector};
use crate::adapters::lifecycle::Releasable;
use crate::config::{SinkAuth, SinkConfig};
use crate::domain::{ArtifactName, ExportError, ExportResult};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use std::sync::Arc;
use url::Url;

/// Blob service REST API version sent with every request
pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// OAuth scope for Azure Storage
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Content type stored with uploaded artifacts
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// How requests are authorized
enum Credential {
    SharedKey(SharedKeySigner),
    Sas(String),
    ServicePrincipal(Arc<ClientSecretCredential>),
}

impl Credential {
    fn describe(&self) -> &'static str {
        match self {
            Self::SharedKey(_) => "shared_key",
            Self::Sas(_) => "sas",
            Self::ServicePrincipal(_) => "service_principal",
        }
    }
}

/// Creates [`BlobSinkClient`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct BlobSinkConnector;

impl BlobSinkConnector {
    /// Creates a new connector
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SinkConnector for BlobSinkConnector {
    async fn connect(&self, config: &SinkConfig) -> ExportResult<Box<dyn SinkClient>> {
        let client = BlobSinkClient::new(config)?;
        Ok(Box::new(client))
    }
}

/// Client for one storage account
pub struct BlobSinkClient {
    http: reqwest::Client,
    endpoint: Url,
    credential: Credential,
    block_size: usize,
}

impl BlobSinkClient {
    /// Builds a client from the sink configuration
    ///
    /// # Errors
    ///
    /// Returns `SinkConnect` if the connection string is malformed, carries no
    /// usable credential, or the service principal cannot be created.
    pub fn new(config: &SinkConfig) -> ExportResult<Self> {
        let connection = StorageConnection::parse(config.connection_string.expose_secret())
            .map_err(ExportError::SinkConnect)?;

        let credential = match config.auth {
            SinkAuth::ConnectionString => credential_from_connection(&connection)?,
            SinkAuth::ServicePrincipal => service_principal(config)?,
        };

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ExportError::SinkConnect(format!("Failed to create HTTP client: {e}")))?;

        tracing::debug!(
            endpoint = %connection.blob_endpoint,
            auth = credential.describe(),
            "Blob client created"
        );

        Ok(Self {
            http,
            endpoint: connection.blob_endpoint,
            credential,
            block_size: config.block_size_bytes.max(1),
        })
    }

    /// URL of `container`, or of `blob` inside it
    fn resource_url(&self, container: &str, blob: Option<&str>) -> ExportResult<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ExportError::SinkConnect(format!(
                    "Blob endpoint {} cannot be a base",
                    self.endpoint
                ))
            })?;
            segments.pop_if_empty().push(container);
            if let Some(blob) = blob {
                segments.push(blob);
            }
        }
        Ok(url)
    }

    /// Sends one authorized request
    ///
    /// Errors are returned as plain messages; callers decide the error kind.
    async fn send(
        &self,
        method: Method,
        mut url: Url,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, String> {
        if let Credential::Sas(token) = &self.credential {
            // Appended verbatim; the token is already percent-encoded
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{token}"),
                _ => token.clone(),
            };
            url.set_query(Some(&query));
        }

        let mut builder = self
            .http
            .request(method, url)
            .headers(headers)
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("x-ms-date", rfc1123_now());
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let mut request = builder.build().map_err(|e| e.to_string())?;

        match &self.credential {
            Credential::SharedKey(signer) => signer.sign(&mut request)?,
            Credential::Sas(_) => {}
            Credential::ServicePrincipal(credential) => {
                let token = TokenCredential::get_token(&**credential, &[STORAGE_SCOPE], None)
                    .await
                    .map_err(|e| format!("Failed to acquire Azure AD token: {e}"))?;
                let value = HeaderValue::from_str(&format!("Bearer {}", token.token.secret()))
                    .map_err(|e| e.to_string())?;
                request.headers_mut().insert(AUTHORIZATION, value);
            }
        }

        self.http.execute(request).await.map_err(|e| e.to_string())
    }

    async fn put_blob(&self, url: Url, payload: Vec<u8>) -> ExportResult<()> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-blob-type"),
            HeaderValue::from_static("BlockBlob"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CSV_CONTENT_TYPE));

        let response = self
            .send(Method::PUT, url, headers, Some(payload))
            .await
            .map_err(ExportError::SinkUpload)?;
        expect_created(response, "Put Blob").await
    }

    async fn put_blocks(&self, url: Url, payload: Vec<u8>) -> ExportResult<()> {
        let mut block_ids = Vec::new();

        for (index, chunk) in payload.chunks(self.block_size).enumerate() {
            // Block ids must all have the same length before encoding
            let block_id = general_purpose::STANDARD.encode(format!("block-{index:08}"));

            let mut block_url = url.clone();
            block_url
                .query_pairs_mut()
                .append_pair("comp", "block")
                .append_pair("blockid", &block_id);

            let response = self
                .send(Method::PUT, block_url, HeaderMap::new(), Some(chunk.to_vec()))
                .await
                .map_err(ExportError::SinkUpload)?;
            expect_created(response, "Put Block").await?;

            tracing::debug!(block = index, bytes = chunk.len(), "Block staged");
            block_ids.push(block_id);
        }

        let mut list_url = url;
        list_url.query_pairs_mut().append_pair("comp", "blocklist");

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-blob-content-type"),
            HeaderValue::from_static(CSV_CONTENT_TYPE),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        let response = self
            .send(
                Method::PUT,
                list_url,
                headers,
                Some(block_list_xml(&block_ids).into_bytes()),
            )
            .await
            .map_err(ExportError::SinkUpload)?;
        expect_created(response, "Put Block List").await
    }
}

#[async_trait]
impl SinkClient for BlobSinkClient {
    async fn container_exists(&self, container: &str) -> ExportResult<bool> {
        let mut url = self.resource_url(container, None)?;
        url.query_pairs_mut().append_pair("restype", "container");

        let response = self
            .send(Method::HEAD, url, HeaderMap::new(), None)
            .await
            .map_err(ExportError::SinkRequest)?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ExportError::SinkRequest(format!(
                "Container lookup returned {}{}",
                status,
                error_code_suffix(&response)
            ))),
        }
    }

    async fn upload(
        &self,
        container: &str,
        name: &ArtifactName,
        payload: Vec<u8>,
    ) -> ExportResult<()> {
        let url = self.resource_url(container, Some(name.as_str()))?;

        if payload.len() <= self.block_size {
            self.put_blob(url, payload).await
        } else {
            tracing::debug!(
                bytes = payload.len(),
                block_size = self.block_size,
                "Payload exceeds block size, staging blocks"
            );
            self.put_blocks(url, payload).await
        }
    }
}

#[async_trait]
impl Releasable for BlobSinkClient {
    // Requests are stateless; pooled sockets close when the client drops
    async fn release(&mut self) -> ExportResult<()> {
        Ok(())
    }
}

fn credential_from_connection(connection: &StorageConnection) -> ExportResult<Credential> {
    match (
        &connection.account_name,
        &connection.account_key,
        &connection.sas_token,
    ) {
        (Some(account), Some(key), _) => SharedKeySigner::new(account, key)
            .map(Credential::SharedKey)
            .map_err(ExportError::SinkConnect),
        (_, _, Some(sas)) => Ok(Credential::Sas(sas.clone())),
        _ => Err(ExportError::SinkConnect(
            "Connection string carries neither AccountKey nor SharedAccessSignature".to_string(),
        )),
    }
}

fn service_principal(config: &SinkConfig) -> ExportResult<Credential> {
    let missing = |field: &str| {
        ExportError::SinkConnect(format!(
            "sink.{field} is required when sink.auth is 'service_principal'"
        ))
    };

    let tenant_id = config.tenant_id.as_deref().ok_or_else(|| missing("tenant_id"))?;
    let client_id = config
        .client_id
        .clone()
        .ok_or_else(|| missing("client_id"))?;
    let client_secret: String = config
        .client_secret
        .as_ref()
        .ok_or_else(|| missing("client_secret"))?
        .expose_secret()
        .clone()
        .into();

    let secret = azure_core::credentials::Secret::new(client_secret);
    let credential = ClientSecretCredential::new(tenant_id, client_id, secret, None)
        .map_err(|e| {
            ExportError::SinkConnect(format!("Failed to create Azure AD credential: {e}"))
        })?;

    Ok(Credential::ServicePrincipal(credential))
}

async fn expect_created(response: reqwest::Response, operation: &str) -> ExportResult<()> {
    let status = response.status();
    if status == StatusCode::CREATED {
        return Ok(());
    }

    let code = error_code_suffix(&response);
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(operation, %status, body = %body, "Blob request rejected");

    Err(ExportError::SinkUpload(format!(
        "{operation} returned {status}{code}"
    )))
}

fn error_code_suffix(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(|code| format!(" ({code})"))
        .unwrap_or_default()
}

fn block_list_xml(block_ids: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in block_ids {
        xml.push_str("<Latest>");
        xml.push_str(id);
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}

fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
