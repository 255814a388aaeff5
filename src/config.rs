//! read client configuration from a file or the environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;
use crate::messages::UserMessages;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_REFRESH_COOLDOWN_MS: u64 = 5_000;
const DEFAULT_REFRESH_SKEW_SECS: u64 = 30;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_refresh_cooldown_ms")]
    pub refresh_cooldown_ms: u64,
    /// Access tokens expiring within this many seconds are refreshed before use.
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: u64,
    /// Persist tokens to this JSON file; in-memory storage when absent.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub messages: UserMessages,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u8,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_login_path() -> String {
    "/auth/login/".to_string()
}

fn default_refresh_path() -> String {
    "/auth/token/refresh/".to_string()
}

fn default_refresh_cooldown_ms() -> u64 {
    DEFAULT_REFRESH_COOLDOWN_MS
}

fn default_refresh_skew_secs() -> u64 {
    DEFAULT_REFRESH_SKEW_SECS
}

/// Whole milliseconds, saturating instead of truncating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Configuration with defaults for everything except the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetrySettings::default(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            refresh_cooldown_ms: DEFAULT_REFRESH_COOLDOWN_MS,
            refresh_skew_secs: DEFAULT_REFRESH_SKEW_SECS,
            token_file: None,
            messages: UserMessages::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// # ENV Vars
    /// * `API_BASE_URL` - backend base URL (required)
    /// * `API_TIMEOUT_MS` - per-request timeout in milliseconds
    /// * `API_TOKEN_FILE` - path of the persisted token file
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("API_BASE_URL")
            .map_err(|_| Error::Config("Missing API_BASE_URL env var".to_string()))?;
        let mut config = Self::new(base_url);
        if let Ok(raw) = std::env::var("API_TIMEOUT_MS") {
            config.timeout_ms = raw.parse().map_err(|e| {
                Error::Config(format!("Invalid API_TIMEOUT_MS '{}': {}", raw, e))
            })?;
        }
        if let Ok(path) = std::env::var("API_TOKEN_FILE")
            && !path.is_empty()
        {
            config.token_file = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    pub fn with_retry(mut self, max_attempts: u8, base_delay: Duration) -> Self {
        self.retry = RetrySettings {
            max_attempts,
            base_delay_ms: millis(base_delay),
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = millis(timeout);
        self
    }

    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown_ms = millis(cooldown);
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.refresh_cooldown_ms)
    }

    pub fn refresh_skew(&self) -> Duration {
        Duration::from_secs(self.refresh_skew_secs)
    }

    /// Normalized base URL without a trailing slash. Fails fast on unparsable input.
    pub fn validated_base_url(&self) -> Result<String, Error> {
        let base = if self.base_url.starts_with("http") {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        };
        reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        Ok(base.trim_end_matches('/').to_string())
    }
}
