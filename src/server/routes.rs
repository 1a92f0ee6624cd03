use super::ndjson::ndjson_response;
use crate::catalog::{PipelineError, SearchPipeline};
use crate::diagnostics::RequestContext;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub author: Option<String>,
}

/// `GET /api/books/search?author=`
pub async fn search(
    State(pipeline): State<Arc<SearchPipeline>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(author) = params.author else {
        warn!(parent: ctx.span(), "Search without author");
        return (StatusCode::BAD_REQUEST, "missing query parameter: author").into_response();
    };

    let limit = pipeline.config().max_query_chars;
    if author.chars().count() > limit {
        warn!(parent: ctx.span(), limit, "Author query too long");
        return (
            StatusCode::BAD_REQUEST,
            format!("author longer than {} characters", limit),
        )
            .into_response();
    }

    match pipeline.search(&author, ctx.clone()).await {
        Ok(records) => ndjson_response(records),
        Err(e @ PipelineError::Generate(_)) => {
            error!(parent: ctx.span(), error = %e, "Cannot build corpus");
            (StatusCode::INSUFFICIENT_STORAGE, e.to_string()).into_response()
        }
        Err(e) => {
            error!(parent: ctx.span(), error = %e, "Search failed before streaming");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
