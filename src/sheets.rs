//! Google Sheets v4 REST client

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::format::{to_requests, FormatOp};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// The spreadsheet operations the pipeline needs
pub trait SpreadsheetClient {
    /// Numeric id of the tab named `sheet`
    fn sheet_id(&self, sheet: &str) -> impl Future<Output = Result<i64>> + Send;

    /// Remove all values and formatting from the tab
    fn clear(&self, sheet: &str) -> impl Future<Output = Result<()>> + Send;

    /// Append rows after existing content; formulas are evaluated
    fn append_rows(
        &self,
        sheet: &str,
        values: &[Vec<String>],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Apply formatting ops in order
    fn apply_formats(&self, sheet: &str, ops: &[FormatOp])
        -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Service-account key: the JSON document itself or a path to it.
    /// Tokens are minted from it and refreshed before they expire.
    pub service_account: String,
    /// Fixed OAuth bearer token. Takes precedence over `service_account`;
    /// it is never refreshed.
    pub access_token: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            service_account: String::new(),
            access_token: String::new(),
            api_base: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
}

/// Where bearer tokens come from
#[derive(Clone)]
pub enum Credentials {
    /// Nothing configured; read-only use only
    Missing,
    Bearer(String),
    ServiceAccount(Arc<CustomServiceAccount>),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Missing => f.write_str("Missing"),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
            Credentials::ServiceAccount(_) => f.write_str("ServiceAccount(..)"),
        }
    }
}

impl Credentials {
    pub fn from_config(config: &SheetsConfig) -> Result<Self> {
        let token = config.access_token.trim();
        if !token.is_empty() {
            return Ok(Credentials::Bearer(token.to_string()));
        }

        let key = config.service_account.trim();
        if key.is_empty() {
            return Ok(Credentials::Missing);
        }
        let account = if key.starts_with('{') {
            CustomServiceAccount::from_json(key)
        } else {
            CustomServiceAccount::from_file(key)
        }
        .map_err(|source| Error::Auth {
            context: "invalid service-account key",
            source,
        })?;
        Ok(Credentials::ServiceAccount(Arc::new(account)))
    }

    /// A currently valid bearer token
    pub async fn token(&self) -> Result<String> {
        match self {
            Credentials::Missing => Err(Error::Config(config::ConfigError::Message(
                "no sheets credentials: set sheets.service_account or sheets.access_token"
                    .to_string(),
            ))),
            Credentials::Bearer(token) => Ok(token.clone()),
            Credentials::ServiceAccount(account) => {
                // cached by gcp_auth until shortly before expiry
                let token = account
                    .token(&[SHEETS_SCOPE])
                    .await
                    .map_err(|source| Error::Auth {
                        context: "failed to obtain access token",
                        source,
                    })?;
                Ok(token.as_str().to_string())
            }
        }
    }
}

/// Client bound to a single spreadsheet
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base: Url,
    spreadsheet_id: String,
    credentials: Credentials,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let base = Url::parse(&config.api_base).map_err(|e| {
            Error::Config(config::ConfigError::Message(format!(
                "invalid sheets.api_base `{}`: {e}",
                config.api_base
            )))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self {
            http,
            base,
            spreadsheet_id: config.spreadsheet_id.clone(),
            credentials: Credentials::from_config(config)?,
        })
    }

    /// `{base}/{spreadsheet_id}{suffix}` followed by `segments`, each percent-encoded
    fn endpoint(&self, suffix: &str, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push(&format!("{}{}", self.spreadsheet_id, suffix))
                .extend(segments);
        }
        url
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Value> {
        let token = self.credentials.token().await?;
        let resp = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(Error::SheetsTransport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::SheetsApi {
                operation,
                status,
                body,
            });
        }

        // some endpoints answer with an empty body
        let bytes = resp.bytes().await.map_err(Error::SheetsTransport)?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| Error::SheetsDecode { operation, source })
    }

    async fn batch_update(&self, requests: Vec<Value>) -> Result<()> {
        let url = self.endpoint(":batchUpdate", &[]);
        self.send(
            "batchUpdate",
            self.http.post(url).json(&json!({ "requests": requests })),
        )
        .await?;
        Ok(())
    }
}

impl SpreadsheetClient for SheetsClient {
    async fn sheet_id(&self, sheet: &str) -> Result<i64> {
        let mut url = self.endpoint("", &[]);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");

        let meta = self.send("get", self.http.get(url)).await?;
        find_sheet_id(&parse_meta(meta)?, sheet)
    }

    async fn clear(&self, sheet: &str) -> Result<()> {
        let sheet_id = self.sheet_id(sheet).await?;

        let range = a1_range(sheet);
        let url = self.endpoint("", &["values", &format!("{range}:clear")]);
        self.send("values.clear", self.http.post(url).json(&json!({})))
            .await?;

        self.batch_update(vec![json!({
            "updateCells": {
                "range": { "sheetId": sheet_id },
                "fields": "userEnteredFormat",
            }
        })])
        .await?;

        info!(sheet, "cleared data and formatting");
        Ok(())
    }

    async fn append_rows(&self, sheet: &str, values: &[Vec<String>]) -> Result<()> {
        let range = a1_range(sheet);
        let mut url = self.endpoint("", &["values", &format!("{range}:append")]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        self.send(
            "values.append",
            self.http.post(url).json(&json!({ "values": values })),
        )
        .await?;
        debug!(sheet, rows = values.len(), "appended rows");
        Ok(())
    }

    async fn apply_formats(&self, sheet: &str, ops: &[FormatOp]) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let sheet_id = self.sheet_id(sheet).await?;
        self.batch_update(to_requests(ops, sheet_id)).await?;
        debug!(sheet, ops = ops.len(), "applied formatting");
        Ok(())
    }
}

fn parse_meta(meta: Value) -> Result<SpreadsheetMeta> {
    serde_json::from_value(meta).map_err(|source| Error::SheetsDecode {
        operation: "get",
        source,
    })
}

fn find_sheet_id(meta: &SpreadsheetMeta, sheet: &str) -> Result<i64> {
    meta.sheets
        .iter()
        .find(|s| s.properties.title == sheet)
        .map(|s| s.properties.sheet_id)
        .ok_or_else(|| Error::UnknownSheet(sheet.to_string()))
}

/// Whole-tab range in A1 notation, e.g. `'My Tab'`
pub fn a1_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new(&SheetsConfig {
            spreadsheet_id: "abc123".to_string(),
            access_token: "token".to_string(),
            ..SheetsConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_a1_range_quoting() {
        assert_eq!(a1_range("Tickets"), "'Tickets'");
        assert_eq!(a1_range("Rock'n Roll"), "'Rock''n Roll'");
    }

    #[test]
    fn test_endpoints() {
        let client = client();
        assert_eq!(
            client.endpoint(":batchUpdate", &[]).as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123:batchUpdate"
        );
        assert_eq!(
            client
                .endpoint("", &["values", &format!("{}:append", a1_range("Day Tickets"))])
                .as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Day%20Tickets':append"
        );
    }

    #[test]
    fn test_find_sheet_id() {
        let meta: SpreadsheetMeta = serde_json::from_value(json!({
            "sheets": [
                { "properties": { "title": "Sheet1" } },
                { "properties": { "sheetId": 918273, "title": "Creamfields" } }
            ]
        }))
        .unwrap();

        assert_eq!(find_sheet_id(&meta, "Sheet1").unwrap(), 0);
        assert_eq!(find_sheet_id(&meta, "Creamfields").unwrap(), 918273);
        assert!(matches!(
            find_sheet_id(&meta, "creamfields"),
            Err(Error::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_malformed_metadata_is_decode_error() {
        let err = parse_meta(json!({ "sheets": [{ "properties": { "sheetId": "x" } }] }))
            .unwrap_err();
        assert!(matches!(err, Error::SheetsDecode { operation: "get", .. }));

        let err = parse_meta(Value::Null).unwrap_err();
        assert!(!matches!(err, Error::UnknownSheet(_)));

        let meta = parse_meta(json!({})).unwrap();
        assert!(meta.sheets.is_empty());
    }

    #[test]
    fn test_invalid_api_base_is_config_error() {
        let err = SheetsClient::new(&SheetsConfig {
            api_base: "not a url".to_string(),
            ..SheetsConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!err.is_input());
        assert!(err.to_string().contains("sheets.api_base"));
    }

    #[tokio::test]
    async fn test_access_token_overrides_service_account() {
        let credentials = Credentials::from_config(&SheetsConfig {
            access_token: " ya29.fixed ".to_string(),
            service_account: "/nonexistent/key.json".to_string(),
            ..SheetsConfig::default()
        })
        .unwrap();
        assert!(matches!(credentials, Credentials::Bearer(_)));
        assert_eq!(credentials.token().await.unwrap(), "ya29.fixed");
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_on_use() {
        let credentials = Credentials::from_config(&SheetsConfig::default()).unwrap();
        assert!(matches!(credentials, Credentials::Missing));

        let err = credentials.token().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_service_account_key_rejected_at_startup() {
        for key in ["{\"type\": \"service_account\"}", "/nonexistent/ticket-sheets-key.json"] {
            let err = Credentials::from_config(&SheetsConfig {
                service_account: key.to_string(),
                ..SheetsConfig::default()
            })
            .unwrap_err();
            assert!(matches!(err, Error::Auth { .. }), "{key}");
            assert!(!err.is_input());
        }
    }
}
