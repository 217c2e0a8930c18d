//! Error types shared by the fetch, extraction and spreadsheet layers

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more required request fields were missing or blank
    #[error("{0}")]
    MissingInput(String),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("browser render failed for {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("browser render of {url} did not finish within {timeout:?}")]
    RenderTimeout { url: String, timeout: Duration },

    #[error("sheet \"{0}\" not found in spreadsheet")]
    UnknownSheet(String),

    #[error("sheets API {operation} returned {status}: {body}")]
    SheetsApi {
        operation: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("sheets API transport error: {0}")]
    SheetsTransport(#[source] reqwest::Error),

    #[error("sheets API {operation} returned an unexpected body: {source}")]
    SheetsDecode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("google auth: {context}: {source}")]
    Auth {
        context: &'static str,
        #[source]
        source: gcp_auth::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Errors caused by the caller's input. These are rejected before any I/O
    /// and are not worth retrying without changes.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Error::MissingInput(_) | Error::InvalidSelector { .. } | Error::InvalidUrl { .. }
        )
    }
}
