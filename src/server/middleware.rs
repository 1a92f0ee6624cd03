//! Request logging shared by the provider and the gateway

use crate::diagnostics::RequestContext;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// Give every request a `RequestContext`, log its arrival and the status
/// it was answered with. Handlers pick the context up with
/// `Extension<RequestContext>`.
///
/// The elapsed time covers the response head only; streamed bodies keep
/// flowing after this returns.
pub async fn log_requests(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::new("http");
    let method = request.method().clone();
    let uri = request.uri().clone();
    info!(parent: ctx.span(), method = %method, uri = %uri, "Incoming request");

    request.extensions_mut().insert(ctx.clone());
    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = ctx.elapsed().as_millis() as u64;
    if status.is_success() {
        info!(parent: ctx.span(), status = status.as_u16(), elapsed_ms, "Response started");
    } else {
        warn!(parent: ctx.span(), status = status.as_u16(), elapsed_ms, "Request failed");
    }
    response
}
