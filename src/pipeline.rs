//! Fetch → extract → rows → format plan → sheet
//!
//! Input is validated (required fields, URL, selector syntax) before any I/O.
//! Extraction never fails on missing content; only fetching and sheet
//! writes can. Sheet writes are clear → append → format and are not rolled
//! back if a later step fails.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::extractors::{
    extract_page, CompiledProfile, ExtractedPage, ExtractionMode, LinkStyle, SelectorProfile,
};
use crate::fetch::DocumentSource;
use crate::format::{plan_formatting, FormatOp, StyleConfig};
use crate::rows::{build_rows, header_indices, to_values};
use crate::sheets::SpreadsheetClient;

const MISSING_PUBLISH_FIELDS: &str = "Sheet name, link and content are required.";
const MISSING_PREVIEW_FIELDS: &str = "Link and content are required.";

/// Inbound publish request. Fields are optional so that missing values
/// surface as an input error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishRequest {
    #[serde(default, alias = "targetSheetName")]
    pub sheet: Option<String>,
    #[serde(default, alias = "sourceUrl")]
    pub link: Option<String>,
    /// Scope selector
    #[serde(default, alias = "scopeSelector")]
    pub content: Option<String>,
    #[serde(default)]
    pub mode: Option<ExtractionMode>,
}

/// Read-only request: nothing is written anywhere
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default, alias = "sourceUrl")]
    pub link: Option<String>,
    #[serde(default, alias = "scopeSelector")]
    pub content: Option<String>,
    #[serde(default)]
    pub mode: Option<ExtractionMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    pub values: Vec<Vec<String>>,
    pub formats: Vec<FormatOp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

/// `Some` only for present, non-blank values. The value itself is kept as
/// given: tab titles may carry meaningful surrounding spaces.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A request that passed validation
#[derive(Debug, Clone)]
struct Job {
    link: String,
    scope: String,
    profile: CompiledProfile,
}

pub struct Pipeline<S, C> {
    source: S,
    sheets: C,
    selectors: SelectorProfile,
    style: StyleConfig,
}

impl<S, C> Pipeline<S, C>
where
    S: DocumentSource,
    C: SpreadsheetClient,
{
    pub fn new(source: S, sheets: C, selectors: SelectorProfile, style: StyleConfig) -> Self {
        Self {
            source,
            sheets,
            selectors,
            style,
        }
    }

    pub fn sheets(&self) -> &C {
        &self.sheets
    }

    /// Extract the page and overwrite tab `sheet` with it
    pub async fn publish(&self, request: PublishRequest) -> Result<Published> {
        let (sheet, link, scope) = match (
            required(request.sheet),
            required(request.link),
            required(request.content),
        ) {
            (Some(sheet), Some(link), Some(scope)) => (sheet, link, scope),
            _ => return Err(Error::MissingInput(MISSING_PUBLISH_FIELDS.to_string())),
        };
        let job = self.prepare(link, scope, request.mode)?;

        info!(sheet = %sheet, link = %job.link, scope = %job.scope, "publishing page to sheet");
        let page = self.extract(&job, LinkStyle::Formula).await?;

        let rows = build_rows(&page.title, &job.link, &page.sections);
        let values = to_values(&rows);
        let headers = header_indices(&values);
        let formats = plan_formatting(&values, &headers, &self.style);
        debug!(
            rows = values.len(),
            headers = headers.len(),
            formats = formats.len(),
            "planned sheet layout"
        );

        self.sheets.clear(&sheet).await?;
        self.sheets.append_rows(&sheet, &values).await?;
        self.sheets.apply_formats(&sheet, &formats).await?;

        info!(sheet = %sheet, rows = values.len(), "sheet updated");
        Ok(Published { values, formats })
    }

    /// Extract the page and return its rows with raw hrefs
    pub async fn preview(&self, request: PreviewRequest) -> Result<Preview> {
        let (link, scope) = match (required(request.link), required(request.content)) {
            (Some(link), Some(scope)) => (link, scope),
            _ => return Err(Error::MissingInput(MISSING_PREVIEW_FIELDS.to_string())),
        };
        let job = self.prepare(link, scope, request.mode)?;

        let page = self.extract(&job, LinkStyle::Raw).await?;
        let rows = to_values(&build_rows(&page.title, &job.link, &page.sections));

        Ok(Preview {
            title: page.title,
            rows,
        })
    }

    /// Reject bad URLs and selectors before touching the network
    fn prepare(&self, link: String, scope: String, mode: Option<ExtractionMode>) -> Result<Job> {
        let link = link.trim().to_string();
        let scope = scope.trim().to_string();
        Url::parse(&link).map_err(|source| Error::InvalidUrl {
            url: link.clone(),
            source,
        })?;

        let profile = match mode {
            Some(mode) => self.selectors.clone().with_mode(mode),
            None => self.selectors.clone(),
        };
        let profile = profile.compile(&scope)?;

        Ok(Job {
            link,
            scope,
            profile,
        })
    }

    async fn extract(&self, job: &Job, style: LinkStyle) -> Result<ExtractedPage> {
        let fetched = self.source.fetch(&job.link).await?;
        let page = extract_page(&fetched.html, fetched.base_url.as_ref(), &job.profile, style);

        if page.sections.is_empty() {
            warn!(link = %job.link, scope = %job.scope, "no sections matched");
        } else {
            debug!(
                link = %job.link,
                sections = page.sections.len(),
                items = page.sections.iter().map(|s| s.items.len()).sum::<usize>(),
                "extracted sections"
            );
        }
        Ok(page)
    }
}
