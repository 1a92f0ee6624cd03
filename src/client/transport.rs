//! Transport seam between the retrying client and a provider
//!
//! Implementations:
//! - `HttpTransport`: NDJSON over HTTP (production)
//! - `LocalTransport`: calls a `SearchPipeline` in-process
//! - `SimulatedTransport`: wraps another transport and injects faults

use super::error::TransportError;
use crate::catalog::{Book, SearchPipeline};
use crate::diagnostics::RequestContext;
use futures::stream::{BoxStream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Records of one attempt, in provider order
pub type RecordStream = BoxStream<'static, Result<Book, TransportError>>;

pub trait SearchTransport: Send + Sync + 'static {
    /// Start one attempt. `Ok` means the provider accepted the query; the
    /// stream may still fail part-way.
    fn open<'a>(
        &'a self,
        author: &'a str,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<RecordStream, TransportError>> + Send + 'a>>;
}

impl<T: SearchTransport> SearchTransport for Arc<T> {
    fn open<'a>(
        &'a self,
        author: &'a str,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<RecordStream, TransportError>> + Send + 'a>> {
        (**self).open(author, ctx)
    }
}

/// In-process provider
#[derive(Clone)]
pub struct LocalTransport {
    pipeline: SearchPipeline,
}

impl LocalTransport {
    pub fn new(pipeline: SearchPipeline) -> Self {
        LocalTransport { pipeline }
    }
}

impl SearchTransport for LocalTransport {
    fn open<'a>(
        &'a self,
        author: &'a str,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<RecordStream, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let stream = self.pipeline.search(author, ctx.clone()).await?;
            Ok(stream.map(|item| item.map_err(TransportError::from)).boxed())
        })
    }
}
