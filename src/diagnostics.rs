//! Request-scoped diagnostic context
//!
//! Every logical call carries a `RequestContext` explicitly: it names the
//! request in log output (via its span) and collects the call's retry
//! events so tests and handlers can inspect what happened without any
//! process-wide counters.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// One observable step of a logical search call
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    AttemptStarted { attempt: u32 },
    RetryScheduled { attempt: u32, delay: Duration, cause: String },
    Finished(CallOutcome),
    /// Provider scan worker exited; `complete` is false when it stopped early
    ScanStopped { scanned: u64, matched: u64, complete: bool },
}

/// How a logical search call ended
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success { delivered: u64 },
    FailedTerminal { cause: String },
    FailedExhausted { attempts: u32, cause: String },
    Fatal { cause: String },
}

#[derive(Clone)]
pub struct RequestContext {
    request_id: String,
    started: Instant,
    span: Span,
    events: Arc<Mutex<Vec<CallEvent>>>,
}

impl RequestContext {
    /// Fresh context with a random 8-hex-digit request id.
    pub fn new(operation: &'static str) -> Self {
        Self::with_id(operation, format!("{:08x}", rand::random::<u32>()))
    }

    pub fn with_id(operation: &'static str, request_id: String) -> Self {
        let span = tracing::info_span!("request", id = %request_id, op = operation);
        RequestContext {
            request_id,
            started: Instant::now(),
            span,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn record(&self, event: CallEvent) {
        self.events.lock().push(event);
    }

    /// Snapshot of every event recorded so far
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, CallEvent::AttemptStarted { .. }))
            .count() as u32
    }

    /// Delays of every scheduled retry, in order
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                CallEvent::RetryScheduled { delay, .. } => Some(*delay),
                _ => None,
            })
            .collect()
    }

    /// Final state of the provider scan, once its worker has exited
    pub fn scan_stopped(&self) -> Option<(u64, u64, bool)> {
        self.events.lock().iter().find_map(|e| match e {
            CallEvent::ScanStopped {
                scanned,
                matched,
                complete,
            } => Some((*scanned, *matched, *complete)),
            _ => None,
        })
    }

    pub fn outcome(&self) -> Option<CallOutcome> {
        self.events.lock().iter().rev().find_map(|e| match e {
            CallEvent::Finished(outcome) => Some(outcome.clone()),
            _ => None,
        })
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("events", &self.events.lock().len())
            .finish()
    }
}
