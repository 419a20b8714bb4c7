//! Runtime configuration. Values come from the environment, optionally seeded from a `.env`
//! file in the working directory.

use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use tracing::level_filters::LevelFilter;

use crate::{utils::dir::create_application_default_path, wakatime::DEFAULT_BASE_URL};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    /// Application directory holding credentials, token cache and logs.
    pub app_dir: PathBuf,
    /// Spreadsheet the reports are written to. Only required by `log`.
    pub spreadsheet_id: Option<String>,
    /// OAuth client secret downloaded from the Google Cloud console.
    pub google_client_secret: PathBuf,
    /// Takes precedence over the stored key when set.
    pub wakatime_api_key: Option<String>,
    pub wakatime_base_url: String,
    pub request_timeout: Duration,
    pub log_level: Option<LevelFilter>,
    pub log_console: bool,
}

impl Config {
    /// Loads `.env` (if present) and reads the configuration from the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_dir = match get("WAKALOG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => create_application_default_path()?,
        };

        let request_timeout = get("WAKALOG_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("WAKALOG_TIMEOUT_SECS is not a number: {v}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT);

        let log_level = get("WAKALOG_LOG")
            .map(|v| {
                LevelFilter::from_str(&v)
                    .map_err(|_| anyhow!("WAKALOG_LOG is not a log level: {v}"))
            })
            .transpose()?;

        Ok(Self {
            spreadsheet_id: get("WAKALOG_SPREADSHEET_ID"),
            google_client_secret: get("WAKALOG_GOOGLE_CREDENTIALS")
                .map(PathBuf::from)
                .unwrap_or_else(|| app_dir.join("client_secret.json")),
            wakatime_api_key: get("WAKATIME_API_KEY"),
            wakatime_base_url: get("WAKATIME_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            request_timeout,
            log_level,
            log_console: get("WAKALOG_LOG_CONSOLE")
                .is_some_and(|v| v != "0" && v != "false"),
            app_dir,
        })
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.app_dir.join("credentials.json")
    }

    pub fn sheets_token_path(&self) -> PathBuf {
        self.app_dir.join("sheets_token.json")
    }
}
