//! Page fetching
//!
//! Two backends behind [`DocumentSource`]:
//! - [`HttpFetcher`]: plain GET, static markup
//! - [`ChromeRenderer`]: headless Chrome `--dump-dom`, for script-populated pages
//!
//! Both hand back raw markup; parsing happens later in a synchronous scope.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// Markup of one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub html: String,
    /// Relative hrefs are resolved against this when set
    pub base_url: Option<Url>,
}

/// Anything that can turn a URL into page markup
pub trait DocumentSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage>> + Send;
}

impl<T: DocumentSource + Sync> DocumentSource for &T {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage>> + Send {
        (**self).fetch(url)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Http,
    Chrome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub backend: Backend,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Chrome or Chromium executable
    pub chrome_path: String,
    /// Virtual time Chrome lets scripts run before dumping the DOM
    pub render_budget_ms: u64,
    /// Wall-clock limit for the whole browser process
    pub render_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            chrome_path: "chromium".to_string(),
            render_budget_ms: 5000,
            render_timeout_secs: 30,
        }
    }
}

/// Plain HTTP GET
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let fetch_err = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(fetch_err)?;
        if !resp.status().is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let final_url = resp.url().to_string();
        let html = resp.text().await.map_err(fetch_err)?;
        debug!(url = %final_url, bytes = html.len(), "fetched page");

        // Static markup: hrefs are reported exactly as written
        Ok(FetchedPage {
            url: final_url,
            html,
            base_url: None,
        })
    }
}

/// Headless Chrome, one short-lived process per page
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    binary: String,
    user_agent: String,
    budget: Duration,
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            binary: config.chrome_path.clone(),
            user_agent: config.user_agent.clone(),
            budget: Duration::from_millis(config.render_budget_ms),
            timeout: Duration::from_secs(config.render_timeout_secs),
        }
    }

    fn command(&self, url: &str) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-sandbox",
                "--hide-scrollbars",
                "--mute-audio",
            ])
            .arg(format!("--user-agent={}", self.user_agent))
            .arg(format!("--virtual-time-budget={}", self.budget.as_millis()))
            .arg("--dump-dom")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // the browser dies with the handle on every exit path, timeouts included
            .kill_on_drop(true);
        command
    }
}

impl DocumentSource for ChromeRenderer {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let render_err = |reason: String| Error::Render {
            url: url.to_string(),
            reason,
        };

        info!(url, binary = %self.binary, "rendering page in headless browser");
        let child = self
            .command(url)
            .spawn()
            .map_err(|e| render_err(format!("failed to launch {}: {e}", self.binary)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| render_err(e.to_string()))?,
            Err(_) => {
                return Err(Error::RenderTimeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(render_err(format!(
                "browser exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(url, bytes = html.len(), "rendered page");

        Ok(FetchedPage {
            url: url.to_string(),
            html,
            base_url: Url::parse(url).ok(),
        })
    }
}

/// The configured backend
#[derive(Debug, Clone)]
pub enum Fetcher {
    Http(HttpFetcher),
    Chrome(ChromeRenderer),
}

impl Fetcher {
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(match config.backend {
            Backend::Http => Fetcher::Http(HttpFetcher::new(config)?),
            Backend::Chrome => Fetcher::Chrome(ChromeRenderer::new(config)),
        })
    }
}

impl DocumentSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        match self {
            Fetcher::Http(http) => http.fetch(url).await,
            Fetcher::Chrome(chrome) => chrome.fetch(url).await,
        }
    }
}
