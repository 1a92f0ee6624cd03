//! Book Search Gateway
//!
//! Caller-facing API over the provider, with bounded retries.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | BOOK_GATEWAY_ADDR | 0.0.0.0:8080 | Listen address |
//! | BOOK_CLIENT_CONFIG | unset | TOML file with client settings |
//! | BOOK_CLIENT_BASE_URL | http://localhost:8081 | Provider base URL |
//! | BOOK_CLIENT_TIMEOUT_MS | 5000 | Per-attempt deadline |
//! | BOOK_CLIENT_MAX_RETRIES | 3 | Retries after the first attempt |
//! | BOOK_CLIENT_RETRY_DELAY_MS | 1000 | Base backoff delay |
//! | LOG_FORMAT | text | `text` or `json` |
//! | RUST_LOG | info | Log filter |

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use book_search::gateway::{BookGateway, GatewayConfig};
use book_search::observability::{init_tracing, LogConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing(&LogConfig::from_env())?;

    let config = GatewayConfig::from_env()?;
    BookGateway::new(config)?.run().await?;

    Ok(())
}
