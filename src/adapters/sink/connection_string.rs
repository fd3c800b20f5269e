//! Azure Storage connection string parsing
//!
//! Supports the account key form, the SAS form, explicit `BlobEndpoint`
//! overrides and `UseDevelopmentStorage=true` for the local emulator.

use url::Url;

/// Account name of the local storage emulator
pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";

/// Well-known account key of the local storage emulator
pub const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
const DEFAULT_PROTOCOL: &str = "https";

/// Settings extracted from a storage connection string
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConnection {
    /// Base URL of the blob service, without a trailing slash
    pub blob_endpoint: Url,
    /// Storage account name, when given
    pub account_name: Option<String>,
    /// Base64 account key, when given
    pub account_key: Option<String>,
    /// SAS token without the leading `?`, when given
    pub sas_token: Option<String>,
}

impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnection")
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .field("account_name", &self.account_name)
            .field("account_key", &self.account_key.as_ref().map(|_| "[REDACTED]"))
            .field("sas_token", &self.sas_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StorageConnection {
    /// Parses a `Key=Value;Key=Value` connection string
    ///
    /// Keys are matched case-insensitively. Values may themselves contain `=`
    /// (account keys and SAS tokens do).
    ///
    /// # Errors
    ///
    /// Returns a message when a segment has no `=`, when no blob endpoint can be
    /// derived, or when `AccountKey` is given without `AccountName`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut sas_token = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;
        let mut development = false;

        for (index, segment) in value
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .enumerate()
        {
            // The segment itself is not echoed; it may be a mistyped secret
            let (key, val) = segment.split_once('=').ok_or_else(|| {
                format!("Malformed connection string: segment {} has no '='", index + 1)
            })?;
            let val = val.trim().to_string();

            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = Some(val),
                "accountname" => account_name = Some(val),
                "accountkey" => account_key = Some(val),
                "sharedaccesssignature" => {
                    sas_token = Some(val.trim_start_matches('?').to_string())
                }
                "endpointsuffix" => endpoint_suffix = Some(val),
                "blobendpoint" => blob_endpoint = Some(val),
                "usedevelopmentstorage" => development = val.eq_ignore_ascii_case("true"),
                // Queue, table and file endpoints are irrelevant to the blob client
                _ => {}
            }
        }

        if development {
            return Ok(Self {
                blob_endpoint: parse_endpoint(
                    blob_endpoint.as_deref().unwrap_or(DEV_BLOB_ENDPOINT),
                )?,
                account_name: Some(DEV_ACCOUNT_NAME.to_string()),
                account_key: Some(DEV_ACCOUNT_KEY.to_string()),
                sas_token: None,
            });
        }

        if account_key.is_some() && account_name.is_none() {
            return Err("Connection string has AccountKey but no AccountName".to_string());
        }

        let blob_endpoint = match (blob_endpoint, &account_name) {
            (Some(endpoint), _) => parse_endpoint(&endpoint)?,
            (None, Some(account)) => parse_endpoint(&format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL),
                account,
                endpoint_suffix.as_deref().unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ))?,
            (None, None) => {
                return Err(
                    "Connection string needs either BlobEndpoint or AccountName".to_string()
                )
            }
        };

        Ok(Self {
            blob_endpoint,
            account_name,
            account_key,
            sas_token,
        })
    }

    /// True when the string carries an account key or a SAS token
    pub fn has_credentials(&self) -> bool {
        self.account_key.is_some() || self.sas_token.is_some()
    }
}

fn parse_endpoint(value: &str) -> Result<Url, String> {
    let url = Url::parse(value.trim_end_matches('/'))
        .map_err(|e| format!("Invalid blob endpoint '{value}': {e}"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Invalid blob endpoint '{value}': expected an http(s) URL"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_key_form() {
        let conn = StorageConnection::parse(
            "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5==;EndpointSuffix=core.windows.net",
        )
        .unwrap();

        assert_eq!(conn.blob_endpoint.as_str(), "https://acct.blob.core.windows.net/");
        assert_eq!(conn.account_name.as_deref(), Some("acct"));
        assert_eq!(conn.account_key.as_deref(), Some("a2V5=="));
        assert!(conn.sas_token.is_none());
        assert!(conn.has_credentials());
    }

    #[test]
    fn test_parse_defaults_protocol_and_suffix() {
        let conn = StorageConnection::parse("AccountName=acct;AccountKey=a2V5").unwrap();
        assert_eq!(conn.blob_endpoint.as_str(), "https://acct.blob.core.windows.net/");
    }

    #[test]
    fn test_parse_sas_form() {
        let conn = StorageConnection::parse(
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=?sv=2021-08-06&sig=abc%2B",
        )
        .unwrap();

        assert_eq!(conn.sas_token.as_deref(), Some("sv=2021-08-06&sig=abc%2B"));
        assert!(conn.account_name.is_none());
        assert!(conn.has_credentials());
    }

    #[test]
    fn test_parse_development_storage() {
        let conn = StorageConnection::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(
            conn.blob_endpoint.as_str(),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
        assert_eq!(conn.account_name.as_deref(), Some(DEV_ACCOUNT_NAME));
        assert_eq!(conn.account_key.as_deref(), Some(DEV_ACCOUNT_KEY));
    }

    #[test]
    fn test_parse_keys_are_case_insensitive() {
        let conn = StorageConnection::parse("accountname=acct;ACCOUNTKEY=a2V5").unwrap();
        assert_eq!(conn.account_name.as_deref(), Some("acct"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(StorageConnection::parse("AccountKey=a2V5").is_err());
        assert!(StorageConnection::parse("EndpointSuffix=core.windows.net").is_err());
        assert!(StorageConnection::parse("not a connection string").is_err());
        assert!(StorageConnection::parse("BlobEndpoint=ftp://host/x").is_err());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let conn = StorageConnection::parse("AccountName=acct;AccountKey=c2VjcmV0").unwrap();
        let debug = format!("{conn:?}");
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("REDACTED"));
    }
}
