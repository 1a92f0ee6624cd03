//! Caller configuration
//!
//! Loaded from environment variables or a TOML file:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | BOOK_CLIENT_BASE_URL | http://localhost:8081 | Provider base URL |
//! | BOOK_CLIENT_TIMEOUT_MS | 5000 | Per-attempt deadline |
//! | BOOK_CLIENT_MAX_RETRIES | 3 | Retries after the first attempt |
//! | BOOK_CLIENT_RETRY_DELAY_MS | 1000 | Base backoff delay |
//!
//! ```toml
//! base_url = "http://book-service:8081"
//! timeout = 5000
//! max_retries = 3
//! retry_delay = 1000
//! ```

use super::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8081";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

// Explicit limits with _MAX suffix
const MAX_RETRIES_MAX: u32 = 16;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Cannot read config: {}", e),
            ConfigError::Parse(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-attempt deadline (milliseconds on the wire)
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base backoff delay (milliseconds on the wire)
    #[serde(with = "duration_millis")]
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        ClientConfig {
            base_url: std::env::var("BOOK_CLIENT_BASE_URL").unwrap_or(defaults.base_url),
            timeout: env_millis("BOOK_CLIENT_TIMEOUT_MS").unwrap_or(defaults.timeout),
            max_retries: std::env::var("BOOK_CLIENT_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries)
                .min(MAX_RETRIES_MAX),
            retry_delay: env_millis("BOOK_CLIENT_RETRY_DELAY_MS").unwrap_or(defaults.retry_delay),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: ClientConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.max_retries = config.max_retries.min(MAX_RETRIES_MAX);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Fast retries for tests
    pub fn test() -> Self {
        ClientConfig {
            base_url: "http://127.0.0.1:0".to_string(),
            timeout: Duration::from_millis(2_000),
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}

/// Serde helper for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
