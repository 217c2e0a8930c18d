//! Service configuration
//!
//! Layered: optional `ticket_sheets.toml` in the working directory, then
//! `TICKET_SHEETS_*` environment variables with `__` between nested keys,
//! e.g. `TICKET_SHEETS_SHEETS__SPREADSHEET_ID`. `GOOGLE_SERVICE_ACCOUNT` is
//! honoured as a fallback for `sheets.service_account`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extractors::SelectorProfile;
use crate::fetch::FetchConfig;
use crate::format::StyleConfig;
use crate::sheets::SheetsConfig;

const CONFIG_FILE: &str = "ticket_sheets";
const ENV_PREFIX: &str = "TICKET_SHEETS";
const SERVICE_ACCOUNT_ENV: &str = "GOOGLE_SERVICE_ACCOUNT";

/// Comma-separated lists when given through the environment
const LIST_KEYS: [&str; 3] = ["selectors.containers", "selectors.titles", "selectors.items"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sheets: SheetsConfig,
    pub fetch: FetchConfig,
    pub selectors: SelectorProfile,
    pub style: StyleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load from `ticket_sheets.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        let mut env = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let mut builder = config::Config::builder();
        if let Ok(key) = std::env::var(SERVICE_ACCOUNT_ENV) {
            builder = builder.set_default("sheets.service_account", key)?;
        }

        let settings = builder
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(env)
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse a TOML document; unset keys keep their defaults
    pub fn from_toml(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Writing to a spreadsheet needs an id and either a service-account key
    /// or a fixed token
    pub fn require_sheets(&self) -> Result<()> {
        let sheets = &self.sheets;
        let mut missing = Vec::new();
        if sheets.spreadsheet_id.trim().is_empty() {
            missing.push("sheets.spreadsheet_id");
        }
        if sheets.service_account.trim().is_empty() && sheets.access_token.trim().is_empty() {
            missing.push("sheets.service_account (or sheets.access_token)");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(config::ConfigError::Message(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            ))))
        }
    }
}
