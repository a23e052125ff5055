//! Client configuration.
//!
//! A `ClientConfig` is handed to a facade at construction and never changes
//! afterwards. There are no process-wide defaults beyond `Default`.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.soroscan.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "SOROSCAN_BASE_URL";
pub const ENV_API_KEY: &str = "SOROSCAN_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "SOROSCAN_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `SOROSCAN_BASE_URL`, `SOROSCAN_API_KEY` and
    /// `SOROSCAN_TIMEOUT_SECS`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_BASE_URL) {
            Some(url) => Self::new(&url),
            None => Self::default(),
        };
        if let Some(key) = lookup(ENV_API_KEY).filter(|key| !key.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: f64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TIMEOUT_SECS} is not a number: {raw:?}")))?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(Error::Config(format!("{ENV_TIMEOUT_SECS} must be positive, got {raw:?}")));
            }
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|err| Error::Config(format!("{ENV_TIMEOUT_SECS} is out of range ({raw:?}): {err}")))?;
            config = config.with_timeout(timeout);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|err| Error::Config(format!("base_url {:?} is not a URL: {err}", self.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Join a relative endpoint path (leading slash required) onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        debug_assert!(path.starts_with('/'), "endpoint paths are relative: {path}");
        format!("{}{path}", self.base_url)
    }
}
