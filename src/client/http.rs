//! HTTP transport
//!
//! `GET {base_url}/api/books/search?author=<text>` answered with an NDJSON
//! body. The per-attempt `timeout` bounds three things separately: the
//! connect, the wait for the response head, and every idle gap between
//! body chunks. A long result streamed at a steady pace never times out.

use super::config::ClientConfig;
use super::error::TransportError;
use super::transport::{RecordStream, SearchTransport};
use crate::diagnostics::RequestContext;
use crate::wire::{self, LINE_LENGTH_MAX, NDJSON_CONTENT_TYPE};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tracing::{debug, info, Instrument};

pub const SEARCH_PATH: &str = "/api/books/search";

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    search_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::fatal(format!("cannot build HTTP client: {}", e)))?;

        Ok(HttpTransport {
            http,
            search_url: format!("{}{}", config.base_url.trim_end_matches('/'), SEARCH_PATH),
            timeout: config.timeout,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    async fn open_inner(&self, author: &str) -> Result<RecordStream, TransportError> {
        let request = self
            .http
            .get(&self.search_url)
            .query(&[("author", author)])
            .header(reqwest::header::ACCEPT, NDJSON_CONTENT_TYPE);

        info!(method = "GET", url = %self.search_url, author = %author, "Outgoing search request");

        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Err(_) => {
                return Err(TransportError::retryable(format!(
                    "no response within {}ms",
                    self.timeout.as_millis()
                )))
            }
            Ok(Err(e)) => return Err(classify_reqwest(e)),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        info!(status = status.as_u16(), "Search response received");

        if !status.is_success() {
            let body = tokio::time::timeout(self.timeout, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), body.trim()));
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();
        let lines = FramedRead::new(
            StreamReader::new(bytes),
            LinesCodec::new_with_max_length(LINE_LENGTH_MAX),
        );

        Ok(decode_records(lines, self.timeout))
    }
}

impl SearchTransport for HttpTransport {
    fn open<'a>(
        &'a self,
        author: &'a str,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<RecordStream, TransportError>> + Send + 'a>> {
        Box::pin(self.open_inner(author).instrument(ctx.span().clone()))
    }
}

/// Turn NDJSON lines into records, ending the stream after the first error.
fn decode_records<L>(lines: L, idle_timeout: Duration) -> RecordStream
where
    L: futures::Stream<Item = Result<String, LinesCodecError>> + Send + Unpin + 'static,
{
    stream::unfold(Some(lines), move |state| async move {
        let mut lines = state?;
        loop {
            let next = match tokio::time::timeout(idle_timeout, lines.next()).await {
                Err(_) => {
                    let e = TransportError::retryable(format!(
                        "body stalled for {}ms",
                        idle_timeout.as_millis()
                    ));
                    return Some((Err(e), None));
                }
                Ok(None) => return None,
                Ok(Some(next)) => next,
            };

            match next {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    return match wire::decode_line(&line) {
                        Ok(book) => Some((Ok(book), Some(lines))),
                        Err(e) => Some((Err(e.into()), None)),
                    };
                }
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    let e = TransportError::fatal(format!(
                        "wire record longer than {} bytes",
                        LINE_LENGTH_MAX
                    ));
                    return Some((Err(e), None));
                }
                Err(LinesCodecError::Io(e)) => {
                    debug!(error = %e, "Body read failed");
                    let e = TransportError::retryable(format!("body read failed: {}", e));
                    return Some((Err(e), None));
                }
            }
        }
    })
    .boxed()
}

fn classify_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        return TransportError::non_retryable(format!("invalid request: {}", e));
    }
    if let Some(status) = e.status() {
        return TransportError::from_status(status.as_u16(), &e.to_string());
    }
    TransportError::retryable(format!("request failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ErrorClass;
    use futures::TryStreamExt;

    fn lines(
        items: Vec<Result<String, LinesCodecError>>,
    ) -> impl futures::Stream<Item = Result<String, LinesCodecError>> + Send + Unpin + 'static {
        stream::iter(items)
    }

    fn book_line(id: u64) -> String {
        let bytes = wire::encode_book(&crate::catalog::Book::new(id, "t", "a", "g", 1900, 100.0));
        String::from_utf8(bytes.to_vec()).unwrap().trim_end().to_string()
    }

    #[test]
    fn test_search_url() {
        let config = ClientConfig {
            base_url: "http://localhost:8081/".to_string(),
            ..ClientConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.search_url(), "http://localhost:8081/api/books/search");
    }

    #[tokio::test]
    async fn test_decode_skips_blank_lines() {
        let stream = decode_records(
            lines(vec![Ok(book_line(1)), Ok(String::new()), Ok(book_line(2))]),
            Duration::from_secs(1),
        );
        let books: Vec<_> = stream.try_collect().await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_fatal_and_ends_stream() {
        let stream = decode_records(
            lines(vec![Ok(book_line(1)), Ok("{oops".to_string()), Ok(book_line(3))]),
            Duration::from_secs(1),
        );
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_ref().unwrap_err().class, ErrorClass::Fatal);
    }

    #[tokio::test]
    async fn test_io_error_is_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let stream = decode_records(
            lines(vec![Ok(book_line(1)), Err(LinesCodecError::Io(io))]),
            Duration::from_secs(1),
        );
        let items: Vec<_> = stream.collect().await;
        assert!(items[1].as_ref().unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let stalled = stream::pending::<Result<String, LinesCodecError>>();
        let stream = decode_records(stalled, Duration::from_millis(20));
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_retryable());
    }
}
