//! Provider HTTP service
//!
//! ```text
//! GET /api/books/search?author=<text>   NDJSON stream of matching books
//! GET /health
//! ```
//!
//! Status codes: 400 for a missing or oversized `author`, 507 when the
//! corpus cannot be allocated. Failures after the first byte arrive as an
//! `{"error":...}` line at the end of the body.

mod middleware;
mod ndjson;
mod routes;

pub use middleware::log_requests;
pub use ndjson::ndjson_response;
pub use routes::SearchParams;

use crate::catalog::{CatalogConfig, SearchPipeline};
use crate::client::SEARCH_PATH;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub fn build_router(pipeline: Arc<SearchPipeline>) -> Router {
    Router::new()
        .route(SEARCH_PATH, get(routes::search))
        .route("/health", get(routes::health))
        .with_state(pipeline)
        .layer(axum::middleware::from_fn(log_requests))
}

pub struct BookService {
    pipeline: Arc<SearchPipeline>,
}

impl BookService {
    pub fn new(config: CatalogConfig) -> Self {
        BookService {
            pipeline: Arc::new(SearchPipeline::new(config)),
        }
    }

    pub fn pipeline(&self) -> &SearchPipeline {
        &self.pipeline
    }

    pub fn router(&self) -> Router {
        build_router(self.pipeline.clone())
    }

    /// Bind the configured address and serve until the process exits
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.pipeline.config().listen_addr).await?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let config = self.pipeline.config();
        info!(
            addr = %listener.local_addr()?,
            seed = config.seed,
            corpus_size = config.corpus_size,
            cache_corpus = config.cache_corpus,
            "Book service listening"
        );
        axum::serve(listener, self.router()).await
    }
}
