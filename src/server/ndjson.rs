//! NDJSON response bodies

use crate::catalog::Book;
use crate::wire::{self, NDJSON_CONTENT_TYPE};
use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::convert::Infallible;
use tracing::error;

/// Stream `records` as one JSON line each.
///
/// The first `Err` becomes a trailing `{"error":...}` frame and ends the
/// body; the status line has already gone out by then.
pub fn ndjson_response<E>(records: BoxStream<'static, Result<Book, E>>) -> Response
where
    E: std::fmt::Display + Send + 'static,
{
    let frames = stream::unfold(Some(records), |records| async move {
        let mut records = records?;
        let frame: Bytes = match records.next().await? {
            Ok(book) => wire::encode_book(&book),
            Err(e) => {
                error!(error = %e, "Stream failed after response start, sending error frame");
                return Some((Ok::<_, Infallible>(wire::encode_error(&e.to_string())), None));
            }
        };
        Some((Ok(frame), Some(records)))
    });

    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(frames),
    )
        .into_response()
}
