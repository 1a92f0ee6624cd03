//! Caller-facing HTTP gateway
//!
//! Exposes the retrying client over HTTP:
//!
//! ```text
//! GET /api/client/search?author=               NDJSON stream
//! GET /api/client/count?author=                JSON integer
//! GET /api/client/search-by-year?author=&minYear=1900
//! ```
//!
//! Provider outages degrade to empty results. Only fatal failures show up:
//! as a 500 on `count`, and as a trailing error line on the streams.

mod config;

pub use config::GatewayConfig;

use crate::client::{BookClient, HttpTransport, SearchTransport, TransportError, DEFAULT_MIN_YEAR};
use crate::diagnostics::RequestContext;
use crate::server::{log_requests, ndjson_response};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct ClientParams {
    pub author: Option<String>,
    #[serde(rename = "minYear")]
    pub min_year: Option<i32>,
}

pub fn build_router<T: SearchTransport>(client: BookClient<T>) -> Router {
    Router::new()
        .route("/api/client/search", get(search::<T>))
        .route("/api/client/count", get(count::<T>))
        .route("/api/client/search-by-year", get(search_by_year::<T>))
        .route("/health", get(health))
        .with_state(client)
        .layer(axum::middleware::from_fn(log_requests))
}

fn missing_author() -> Response {
    (StatusCode::BAD_REQUEST, "missing query parameter: author").into_response()
}

async fn search<T: SearchTransport>(
    State(client): State<BookClient<T>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ClientParams>,
) -> Response {
    let Some(author) = params.author else {
        return missing_author();
    };
    ndjson_response(client.search_by_author(&author, &ctx))
}

async fn count<T: SearchTransport>(
    State(client): State<BookClient<T>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ClientParams>,
) -> Response {
    let Some(author) = params.author else {
        return missing_author();
    };
    match client.count_by_author(&author, &ctx).await {
        Ok(count) => Json(count).into_response(),
        Err(e) => {
            error!(parent: ctx.span(), error = %e, "Count failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn search_by_year<T: SearchTransport>(
    State(client): State<BookClient<T>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ClientParams>,
) -> Response {
    let Some(author) = params.author else {
        return missing_author();
    };
    let min_year = params.min_year.unwrap_or(DEFAULT_MIN_YEAR);
    info!(parent: ctx.span(), author = %author, min_year, "Searching by author and year");
    ndjson_response(client.search_by_author_and_year(&author, min_year, &ctx))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub struct BookGateway {
    listen_addr: String,
    client: BookClient<HttpTransport>,
}

impl BookGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.client)?;
        Ok(BookGateway {
            listen_addr: config.listen_addr,
            client: BookClient::new(transport, config.client.retry_policy()),
        })
    }

    pub fn client(&self) -> &BookClient<HttpTransport> {
        &self.client
    }

    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        info!(
            addr = %listener.local_addr()?,
            provider = %self.client.transport().search_url(),
            max_retries = self.client.policy().max_retries,
            "Book gateway listening"
        );
        axum::serve(listener, build_router(self.client)).await
    }
}
