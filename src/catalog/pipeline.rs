//! Provider Search Pipeline
//!
//! generate corpus → per candidate: codec round trip → author match → emit
//!
//! ## Streaming
//!
//! ```text
//! spawn_blocking(scan) ──► mpsc(stream_buffer) ──► CatalogStream
//! ```
//!
//! The scan runs on a blocking worker and parks on `blocking_send` once the
//! channel is full, so it never runs further ahead of the reader than the
//! buffer allows. Dropping the stream closes the channel and the worker
//! stops at its next send.

use super::book::Book;
use super::codec::{self, CodecError};
use super::config::CatalogConfig;
use super::generator::GenerateError;
use super::matcher::AuthorMatcher;
use crate::diagnostics::{CallEvent, RequestContext};
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub type CatalogStream = BoxStream<'static, Result<Book, PipelineError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Generate(GenerateError),
    /// Round trip failed for the record with this id
    Codec { id: u64, error: CodecError },
    /// The blocking worker died before producing a result
    Worker(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Generate(e) => write!(f, "Corpus generation failed: {}", e),
            PipelineError::Codec { id, error } => {
                write!(f, "Round trip failed for book {}: {}", id, error)
            }
            PipelineError::Worker(msg) => write!(f, "Search worker failed: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<GenerateError> for PipelineError {
    fn from(e: GenerateError) -> Self {
        PipelineError::Generate(e)
    }
}

#[derive(Clone)]
pub struct SearchPipeline {
    config: CatalogConfig,
    cache: Arc<Mutex<Option<Arc<Vec<Book>>>>>,
}

impl SearchPipeline {
    pub fn new(config: CatalogConfig) -> Self {
        SearchPipeline {
            config,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Generate the corpus and return a lazy scan over it.
    pub fn search_iter(
        &self,
        query: &str,
        ctx: &RequestContext,
    ) -> Result<SearchIter, GenerateError> {
        let _enter = ctx.span().enter();
        info!(query = %query, "Starting author search");

        let started = Instant::now();
        let corpus = self.corpus()?;
        info!(
            books = corpus.len(),
            cached = self.config.cache_corpus,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Corpus ready"
        );

        Ok(SearchIter::new(corpus, query))
    }

    /// Eager form of the search.
    pub fn collect(&self, query: &str, ctx: &RequestContext) -> Result<Vec<Book>, PipelineError> {
        self.search_iter(query, ctx)?.collect()
    }

    /// Streaming form of the search.
    ///
    /// Corpus generation completes before this returns, so allocation
    /// failure is reported here rather than inside the stream.
    pub async fn search(
        &self,
        query: &str,
        ctx: RequestContext,
    ) -> Result<CatalogStream, PipelineError> {
        let pipeline = self.clone();
        let owned_query = query.to_string();
        let worker_ctx = ctx.clone();
        let iter =
            tokio::task::spawn_blocking(move || pipeline.search_iter(&owned_query, &worker_ctx))
                .await
                .map_err(|e| PipelineError::Worker(e.to_string()))??;

        let (tx, rx) = mpsc::channel(self.config.stream_buffer.max(1));
        tokio::task::spawn_blocking(move || drain_into(iter, tx, ctx));

        let stream = stream::unfold(rx, |mut rx| async move {
            let item = rx.recv().await?;
            Some((item, rx))
        });
        Ok(stream.boxed())
    }

    fn corpus(&self) -> Result<Arc<Vec<Book>>, GenerateError> {
        let generator = self.config.generator();
        if !self.config.cache_corpus {
            return Ok(Arc::new(generator.generate()?));
        }

        let mut slot = self.cache.lock();
        if let Some(corpus) = slot.as_ref() {
            return Ok(corpus.clone());
        }
        let corpus = Arc::new(generator.generate()?);
        *slot = Some(corpus.clone());
        Ok(corpus)
    }
}

fn drain_into(
    mut iter: SearchIter,
    tx: mpsc::Sender<Result<Book, PipelineError>>,
    ctx: RequestContext,
) {
    let _enter = ctx.span().enter();
    let started = Instant::now();

    let complete = loop {
        let Some(item) = iter.next() else {
            break true;
        };
        let failed = item.is_err();
        if let Err(e) = &item {
            error!(error = %e, "Search aborted");
        }
        if tx.blocking_send(item).is_err() {
            debug!(
                scanned = iter.scanned(),
                matched = iter.matched(),
                "Reader went away, stopping scan"
            );
            break false;
        }
        if failed {
            break false;
        }
    };

    if complete {
        info!(
            matched = iter.matched(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );
    }
    ctx.record(CallEvent::ScanStopped {
        scanned: iter.scanned() as u64,
        matched: iter.matched(),
        complete,
    });
}

/// Lazy scan over a corpus, yielding matches in corpus order.
///
/// Fuses after the first error.
pub struct SearchIter {
    corpus: Arc<Vec<Book>>,
    matcher: AuthorMatcher,
    position: usize,
    matched: u64,
    failed: bool,
}

impl SearchIter {
    pub fn new(corpus: Arc<Vec<Book>>, query: &str) -> Self {
        SearchIter {
            corpus,
            matcher: AuthorMatcher::new(query),
            position: 0,
            matched: 0,
            failed: false,
        }
    }

    pub fn scanned(&self) -> usize {
        self.position
    }

    pub fn matched(&self) -> u64 {
        self.matched
    }
}

impl Iterator for SearchIter {
    type Item = Result<Book, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while let Some(candidate) = self.corpus.get(self.position) {
            self.position += 1;
            match codec::round_trip(candidate) {
                Ok(book) => {
                    if self.matcher.matches(&book.author) {
                        self.matched += 1;
                        return Some(Ok(book));
                    }
                }
                Err(error) => {
                    self.failed = true;
                    return Some(Err(PipelineError::Codec {
                        id: candidate.id,
                        error,
                    }));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn ctx() -> RequestContext {
        RequestContext::new("test")
    }

    #[test]
    fn test_results_in_corpus_order() {
        let pipeline = SearchPipeline::new(CatalogConfig::test());
        let books = pipeline.collect("Толстой", &ctx()).unwrap();
        assert!(!books.is_empty());
        assert!(books.windows(2).all(|w| w[0].id < w[1].id));
        assert!(books.iter().all(|b| b.author == "Толстой Л.Н."));
    }

    #[test]
    fn test_empty_query_returns_whole_corpus() {
        let config = CatalogConfig::test();
        let pipeline = SearchPipeline::new(config.clone());
        let books = pipeline.collect("", &ctx()).unwrap();
        assert_eq!(books, config.generator().generate().unwrap());
    }

    #[test]
    fn test_no_match() {
        let pipeline = SearchPipeline::new(CatalogConfig::test());
        assert!(pipeline.collect("Несуществующий Автор", &ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_cache_does_not_change_results() {
        let fresh = SearchPipeline::new(CatalogConfig::test());
        let cached = SearchPipeline::new(CatalogConfig {
            cache_corpus: true,
            ..CatalogConfig::test()
        });
        let expected = fresh.collect("ов", &ctx()).unwrap();
        assert_eq!(cached.collect("ов", &ctx()).unwrap(), expected);
        assert_eq!(cached.collect("ов", &ctx()).unwrap(), expected);
    }

    #[test]
    fn test_codec_failure_is_reported_not_dropped() {
        let corpus = Arc::new(vec![
            Book::new(1, "ok", "Гоголь Н.В.", "Повесть", 1835, 150.0),
            Book::new(2, "bad, title", "Гоголь Н.В.", "Повесть", 1836, 150.0),
            Book::new(3, "ok", "Гоголь Н.В.", "Повесть", 1837, 150.0),
        ]);
        let results: Vec<_> = SearchIter::new(corpus, "гоголь").collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(PipelineError::Codec { id: 2, .. })));
    }

    #[test]
    fn test_iter_counters() {
        let corpus = Arc::new(CatalogConfig::test().generator().generate().unwrap());
        let mut iter = SearchIter::new(corpus.clone(), "Пушкин");
        let first = iter.next().unwrap().unwrap();
        assert_eq!(iter.scanned() as u64, first.id);
        assert_eq!(iter.matched(), 1);
        let rest = iter.count();
        assert_eq!(
            rest + 1,
            corpus.iter().filter(|b| b.author.contains("Пушкин")).count()
        );
    }

    #[tokio::test]
    async fn test_stream_matches_eager() {
        let pipeline = SearchPipeline::new(CatalogConfig::test());
        let eager = pipeline.collect("чехов", &ctx()).unwrap();
        let streamed: Vec<Book> = pipeline
            .search("чехов", ctx())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(streamed, eager);
    }

    async fn wait_for_scan(ctx: &RequestContext) -> (u64, u64, bool) {
        for _ in 0..500 {
            if let Some(scan) = ctx.scan_stopped() {
                return scan;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("scan worker did not exit");
    }

    #[tokio::test]
    async fn test_full_scan_recorded() {
        let pipeline = SearchPipeline::new(CatalogConfig::test());
        let ctx = ctx();
        let books: Vec<Book> = pipeline
            .search("Гоголь", ctx.clone())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let (scanned, matched, complete) = wait_for_scan(&ctx).await;
        assert!(complete);
        assert_eq!(scanned as usize, CatalogConfig::test().corpus_size);
        assert_eq!(matched, books.len() as u64);
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_producer() {
        let config = CatalogConfig {
            corpus_size: 200_000,
            ..CatalogConfig::test()
        };
        let buffer = config.stream_buffer as u64;
        let pipeline = SearchPipeline::new(config);
        let ctx = ctx();

        let mut stream = pipeline.search("", ctx.clone()).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.id, 1);
        drop(stream);

        let (scanned, matched, complete) = wait_for_scan(&ctx).await;
        assert!(!complete);
        assert!(scanned <= buffer + 2, "worker scanned {} records", scanned);
        assert_eq!(matched, scanned);
    }
}
