//! The project scanner configuration.

use std::{fmt::Display, fs, path::Path, time::Duration};

use custom_debug::CustomDebug;
use scanner_framework::config::Hidden;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use url::Url;

use crate::errors::ConfigError;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[serde_as]
#[derive(Clone, CustomDebug, Deserialize)]
pub struct Config {
    /// GitLab instance base URL, e.g. `https://gitlab.example.com`
    #[serde_as(as = "DisplayFromStr")]
    #[debug(with = Display::fmt)]
    pub gitlab_url: Url,
    /// GitLab access token with `read_api` scope
    pub gitlab_token: Hidden<String>,
    /// Only projects created within this many days are considered (0 or unset disables the
    /// filter)
    #[serde(default)]
    pub project_creation_limit_days: Option<u32>,
    /// Number of projects requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Format log output as JSON
    #[serde(default)]
    pub log_json: bool,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Config {
    /// Load and validate the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Config>(text)?;
        if config.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
