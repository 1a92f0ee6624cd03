//! Retrying stream client and derived operations
//!
//! `search_by_author` returns a lazy stream. Each poll drives the retry
//! state machine as far as needed to produce the next book:
//!
//! ```text
//! open attempt ──► forward records ──► provider done → Success
//!      │                 │
//!      └── failure ◄─────┘  classify → sleep + reopen | stop
//! ```
//!
//! Degrade-gracefully policy: a rejected query and an exhausted retry budget
//! both end the stream without an error item. Only fatal failures reach the
//! consumer as `Err`.
//!
//! A failure after some books were already yielded does not replay them:
//! the next attempt skips as many records as were delivered. The provider
//! emits in corpus order from a seeded corpus, so the skipped prefix is the
//! one already seen.

use super::error::{SearchError, TransportError};
use super::retry::{RetryDecision, RetryPolicy, RetryState, Sleeper, TokioSleeper};
use super::transport::{RecordStream, SearchTransport};
use crate::catalog::Book;
use crate::diagnostics::{CallEvent, CallOutcome, RequestContext};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

pub type BookStream = BoxStream<'static, Result<Book, SearchError>>;

/// `minYear` used by the gateway when the caller gives none
pub const DEFAULT_MIN_YEAR: i32 = 1900;

pub struct BookClient<T: SearchTransport> {
    transport: Arc<T>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<T: SearchTransport> Clone for BookClient<T> {
    fn clone(&self) -> Self {
        BookClient {
            transport: self.transport.clone(),
            policy: self.policy,
            sleeper: self.sleeper.clone(),
        }
    }
}

impl<T: SearchTransport> BookClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        BookClient {
            transport: Arc::new(transport),
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Books whose author contains `author`, in provider order.
    pub fn search_by_author(&self, author: &str, ctx: &RequestContext) -> BookStream {
        info!(parent: ctx.span(), author = %author, "Searching provider by author");

        let call = RetryingCall {
            transport: self.transport.clone(),
            policy: self.policy,
            sleeper: self.sleeper.clone(),
            author: author.to_string(),
            ctx: ctx.clone(),
            state: RetryState::initial(),
            current: None,
            delivered: 0,
            skip: 0,
        };

        stream::unfold(call, |mut call| async move {
            let span = call.ctx.span().clone();
            let item = call.next_item().instrument(span).await?;
            Some((item, call))
        })
        .boxed()
    }

    /// Number of books `search_by_author` yields for `author`.
    pub async fn count_by_author(
        &self,
        author: &str,
        ctx: &RequestContext,
    ) -> Result<u64, SearchError> {
        let count = self
            .search_by_author(author, ctx)
            .try_fold(0u64, |n, _| future::ready(Ok(n + 1)))
            .await?;
        info!(parent: ctx.span(), count, author = %author, "Books counted");
        Ok(count)
    }

    /// `search_by_author` restricted to `year >= min_year`, order preserved.
    pub fn search_by_author_and_year(
        &self,
        author: &str,
        min_year: i32,
        ctx: &RequestContext,
    ) -> BookStream {
        self.search_by_author(author, ctx)
            .try_filter(move |book| future::ready(book.year >= min_year))
            .inspect_ok(|book| debug!(title = %book.title, "Book passes year filter"))
            .boxed()
    }
}

/// State of one logical search call
struct RetryingCall<T: SearchTransport> {
    transport: Arc<T>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    author: String,
    ctx: RequestContext,
    state: RetryState,
    current: Option<RecordStream>,
    /// Books handed to the consumer so far
    delivered: u64,
    /// Records of the current attempt still to drop
    skip: u64,
}

impl<T: SearchTransport> RetryingCall<T> {
    async fn next_item(&mut self) -> Option<Result<Book, SearchError>> {
        loop {
            let attempt = match self.state {
                RetryState::Attempting(n) => n,
                _ => return None,
            };

            let records = match self.current.as_mut() {
                Some(records) => records,
                None => {
                    self.ctx.record(CallEvent::AttemptStarted { attempt });
                    debug!(attempt, "Opening search attempt");
                    match self.transport.open(&self.author, &self.ctx).await {
                        Ok(records) => {
                            self.skip = self.delivered;
                            self.current = Some(records);
                        }
                        Err(e) => {
                            if let Some(fatal) = self.fail(attempt, e).await {
                                return Some(Err(fatal));
                            }
                        }
                    }
                    continue;
                }
            };

            match records.next().await {
                Some(Ok(book)) => {
                    if self.skip > 0 {
                        self.skip -= 1;
                        continue;
                    }
                    self.delivered += 1;
                    return Some(Ok(book));
                }
                Some(Err(e)) => {
                    self.current = None;
                    if let Some(fatal) = self.fail(attempt, e).await {
                        return Some(Err(fatal));
                    }
                }
                None => {
                    self.current = None;
                    self.state = self.state.on_success();
                    info!(
                        delivered = self.delivered,
                        attempts = attempt + 1,
                        "Received all books from provider"
                    );
                    self.ctx.record(CallEvent::Finished(CallOutcome::Success {
                        delivered: self.delivered,
                    }));
                    return None;
                }
            }
        }
    }

    /// Apply a failure to the state machine. Returns the error to surface
    /// when the failure is fatal.
    async fn fail(&mut self, attempt: u32, e: TransportError) -> Option<SearchError> {
        match self.state.on_failure(e.class, &self.policy) {
            RetryDecision::Retry { next_attempt, delay } => {
                warn!(
                    retry = next_attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying search"
                );
                self.ctx.record(CallEvent::RetryScheduled {
                    attempt,
                    delay,
                    cause: e.message.clone(),
                });
                self.sleeper.sleep(delay).await;
                self.state = RetryState::Attempting(next_attempt);
                None
            }
            RetryDecision::Stop(terminal) => {
                self.state = terminal;
                let outcome = match terminal {
                    RetryState::FailedTerminal => {
                        error!(error = %e, "Provider rejected search, returning no books");
                        CallOutcome::FailedTerminal { cause: e.message.clone() }
                    }
                    RetryState::Fatal => {
                        error!(error = %e, "Search failed fatally");
                        CallOutcome::Fatal { cause: e.message.clone() }
                    }
                    _ => {
                        error!(
                            attempts = attempt + 1,
                            error = %e,
                            "Retries exhausted, returning no more books"
                        );
                        CallOutcome::FailedExhausted {
                            attempts: attempt + 1,
                            cause: e.message.clone(),
                        }
                    }
                };
                self.ctx.record(CallEvent::Finished(outcome));
                if terminal == RetryState::Fatal {
                    Some(SearchError::from(e))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogConfig, SearchPipeline};
    use crate::client::retry::ImmediateSleeper;
    use crate::client::transport::LocalTransport;
    use std::time::Duration;

    fn client() -> BookClient<LocalTransport> {
        let pipeline = SearchPipeline::new(CatalogConfig::test());
        BookClient::new(
            LocalTransport::new(pipeline),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .with_sleeper(ImmediateSleeper::new())
    }

    #[tokio::test]
    async fn test_search_success_single_attempt() {
        let client = client();
        let ctx = RequestContext::new("test");
        let books: Vec<Book> = client.search_by_author("Пушкин", &ctx).try_collect().await.unwrap();
        assert!(!books.is_empty());
        assert_eq!(ctx.attempts(), 1);
        assert_eq!(
            ctx.outcome(),
            Some(CallOutcome::Success {
                delivered: books.len() as u64
            })
        );
    }

    #[tokio::test]
    async fn test_count_equals_search_length() {
        let client = client();
        for query in ["Толстой", "", "ов", "Несуществующий Автор"] {
            let books: Vec<Book> = client
                .search_by_author(query, &RequestContext::new("test"))
                .try_collect()
                .await
                .unwrap();
            let count = client
                .count_by_author(query, &RequestContext::new("test"))
                .await
                .unwrap();
            assert_eq!(count, books.len() as u64, "query {:?}", query);
        }
    }

    #[tokio::test]
    async fn test_year_filter_is_ordered_subset() {
        let client = client();
        let all: Vec<Book> = client
            .search_by_author("Булгаков", &RequestContext::new("test"))
            .try_collect()
            .await
            .unwrap();
        let filtered: Vec<Book> = client
            .search_by_author_and_year("Булгаков", DEFAULT_MIN_YEAR, &RequestContext::new("test"))
            .try_collect()
            .await
            .unwrap();
        let expected: Vec<Book> = all.into_iter().filter(|b| b.year >= DEFAULT_MIN_YEAR).collect();
        assert_eq!(filtered, expected);
    }

    #[tokio::test]
    async fn test_fatal_surfaces_as_error() {
        let pipeline = SearchPipeline::new(CatalogConfig {
            corpus_size: usize::MAX,
            ..CatalogConfig::test()
        });
        let sleeper = ImmediateSleeper::new();
        let client = BookClient::new(
            LocalTransport::new(pipeline),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .with_sleeper(sleeper.clone());
        let ctx = RequestContext::new("test");

        let result = client.count_by_author("x", &ctx).await;
        assert!(result.is_err());
        assert_eq!(ctx.attempts(), 1);
        assert!(sleeper.requested().is_empty());
        assert!(matches!(ctx.outcome(), Some(CallOutcome::Fatal { .. })));
    }
}
