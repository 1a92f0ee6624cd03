//! Gateway configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | BOOK_GATEWAY_ADDR | 0.0.0.0:8080 | Listen address |
//! | BOOK_CLIENT_CONFIG | unset | TOML file for the provider client |
//!
//! Without `BOOK_CLIENT_CONFIG` the client reads its `BOOK_CLIENT_*`
//! variables (see `ClientConfig`).

use crate::client::{ClientConfig, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub client: ClientConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            listen_addr: DEFAULT_ADDR.to_string(),
            client: ClientConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client = match std::env::var("BOOK_CLIENT_CONFIG") {
            Ok(path) => ClientConfig::load(Path::new(&path))?,
            Err(_) => ClientConfig::from_env(),
        };
        Ok(GatewayConfig {
            listen_addr: std::env::var("BOOK_GATEWAY_ADDR")
                .unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            client,
        })
    }

    pub fn test() -> Self {
        GatewayConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            client: ClientConfig::test(),
        }
    }
}
