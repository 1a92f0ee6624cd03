//! Tracing setup shared by the binaries

mod config;

pub use config::{LogConfig, LogFormat};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the configured
/// default filter.
pub fn init_tracing(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.with_ansi(config.ansi).try_init(),
    }
}
