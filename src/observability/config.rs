//! Logging Configuration
//!
//! All settings are loaded from environment variables:
//!
//! - `RUST_LOG`: filter directives (default: `info`)
//! - `LOG_FORMAT`: `text` or `json` (default: `text`)
//! - `LOG_ANSI`: colored text output (default: true)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Text,
            default_filter: "info".to_string(),
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        LogConfig {
            format: std::env::var("LOG_FORMAT")
                .ok()
                .and_then(|v| Self::parse_format(&v))
                .unwrap_or(defaults.format),
            default_filter: defaults.default_filter,
            ansi: std::env::var("LOG_ANSI")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.ansi),
        }
    }

    fn parse_format(value: &str) -> Option<LogFormat> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "text" | "pretty" => Some(LogFormat::Text),
            _ => None,
        }
    }
}
