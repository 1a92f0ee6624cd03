//! Book Search Provider
//!
//! Streams books from a seeded corpus whose author contains the query.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | BOOK_SERVICE_ADDR | 0.0.0.0:8081 | Listen address |
//! | BOOK_SERVICE_SEED | 42 | Corpus seed |
//! | BOOK_SERVICE_CORPUS_SIZE | 200000 | Books per request |
//! | BOOK_SERVICE_CACHE_CORPUS | false | Keep the corpus between requests |
//! | LOG_FORMAT | text | `text` or `json` |
//! | RUST_LOG | info | Log filter |

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use book_search::catalog::CatalogConfig;
use book_search::observability::{init_tracing, LogConfig};
use book_search::server::BookService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing(&LogConfig::from_env())?;

    let config = CatalogConfig::from_env();
    BookService::new(config).run().await?;

    Ok(())
}
