//! Simulated Transport with Fault Injection
//!
//! Wraps another transport and injects failures from a seeded RNG, so a
//! failing run can be replayed exactly from its seed. A script of faults
//! can be queued ahead of the random ones for tests that need an exact
//! failure sequence.

use super::error::TransportError;
use super::transport::{RecordStream, SearchTransport};
use crate::catalog::DeterministicRng;
use crate::diagnostics::RequestContext;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// A single injected failure, applied to one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Connection refused before any response
    ConnectRefused,
    /// No response within the deadline
    Timeout,
    /// HTTP 500
    ServerError,
    /// HTTP 400
    BadRequest,
    /// Connection reset after this many records
    CutAfter(u64),
    /// Malformed record after this many records
    Corrupt(u64),
}

/// Configuration for simulated fault injection
#[derive(Debug, Clone)]
pub struct SimulatedTransportConfig {
    pub connect_fail_prob: f64,
    pub timeout_prob: f64,
    pub server_error_prob: f64,
    pub bad_request_prob: f64,
    pub cut_prob: f64,
    pub corrupt_prob: f64,
    /// Cut/corrupt points are drawn from `[0, cut_point_max)`
    pub cut_point_max: u64,
    /// Simulated latency range in microseconds (min, max)
    pub latency_range_us: (u64, u64),
}

impl Default for SimulatedTransportConfig {
    fn default() -> Self {
        SimulatedTransportConfig {
            connect_fail_prob: 0.05,
            timeout_prob: 0.05,
            server_error_prob: 0.05,
            bad_request_prob: 0.01,
            cut_prob: 0.05,
            corrupt_prob: 0.0,
            cut_point_max: 100,
            latency_range_us: (0, 0),
        }
    }
}

impl SimulatedTransportConfig {
    /// High chaos configuration for stress testing
    pub fn high_chaos() -> Self {
        SimulatedTransportConfig {
            connect_fail_prob: 0.15,
            timeout_prob: 0.1,
            server_error_prob: 0.15,
            bad_request_prob: 0.02,
            cut_prob: 0.2,
            corrupt_prob: 0.01,
            cut_point_max: 200,
            latency_range_us: (0, 500),
        }
    }

    /// No faults - for baseline testing
    pub fn no_faults() -> Self {
        SimulatedTransportConfig {
            connect_fail_prob: 0.0,
            timeout_prob: 0.0,
            server_error_prob: 0.0,
            bad_request_prob: 0.0,
            cut_prob: 0.0,
            corrupt_prob: 0.0,
            cut_point_max: 1,
            latency_range_us: (0, 0),
        }
    }
}

/// Statistics for fault injection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedTransportStats {
    pub opens: u64,
    pub connect_failures: u64,
    pub timeouts: u64,
    pub server_errors: u64,
    pub bad_requests: u64,
    pub cuts: u64,
    pub corruptions: u64,
}

struct SimulatedInner {
    rng: DeterministicRng,
    script: VecDeque<Option<Fault>>,
    stats: SimulatedTransportStats,
}

pub struct SimulatedTransport<T: SearchTransport> {
    inner: T,
    config: SimulatedTransportConfig,
    state: Arc<Mutex<SimulatedInner>>,
}

impl<T: SearchTransport> SimulatedTransport<T> {
    pub fn new(inner: T, seed: u64, config: SimulatedTransportConfig) -> Self {
        SimulatedTransport {
            inner,
            config,
            state: Arc::new(Mutex::new(SimulatedInner {
                rng: DeterministicRng::new(seed),
                script: VecDeque::new(),
                stats: SimulatedTransportStats::default(),
            })),
        }
    }

    /// Exact faults for the next attempts, consumed one per attempt.
    /// `None` lets an attempt through untouched.
    pub fn with_script(self, faults: impl IntoIterator<Item = Option<Fault>>) -> Self {
        self.state.lock().script.extend(faults);
        self
    }

    pub fn stats(&self) -> SimulatedTransportStats {
        self.state.lock().stats.clone()
    }

    fn next_fault(&self) -> (Option<Fault>, Duration) {
        let mut s = self.state.lock();
        s.stats.opens += 1;

        let scripted = s.script.pop_front();
        let fault = match scripted {
            Some(scripted) => scripted,
            None => random_fault(&mut s.rng, &self.config),
        };

        let (min, max) = self.config.latency_range_us;
        let latency_us = if max > min { s.rng.gen_range(min, max) } else { min };

        match fault {
            Some(Fault::ConnectRefused) => s.stats.connect_failures += 1,
            Some(Fault::Timeout) => s.stats.timeouts += 1,
            Some(Fault::ServerError) => s.stats.server_errors += 1,
            Some(Fault::BadRequest) => s.stats.bad_requests += 1,
            Some(Fault::CutAfter(_)) => s.stats.cuts += 1,
            Some(Fault::Corrupt(_)) => s.stats.corruptions += 1,
            None => {}
        }

        (fault, Duration::from_micros(latency_us))
    }
}

fn random_fault(rng: &mut DeterministicRng, config: &SimulatedTransportConfig) -> Option<Fault> {
    if rng.gen_bool(config.connect_fail_prob) {
        return Some(Fault::ConnectRefused);
    }
    if rng.gen_bool(config.timeout_prob) {
        return Some(Fault::Timeout);
    }
    if rng.gen_bool(config.server_error_prob) {
        return Some(Fault::ServerError);
    }
    if rng.gen_bool(config.bad_request_prob) {
        return Some(Fault::BadRequest);
    }
    if rng.gen_bool(config.corrupt_prob) {
        return Some(Fault::Corrupt(rng.gen_range(0, config.cut_point_max)));
    }
    if rng.gen_bool(config.cut_prob) {
        return Some(Fault::CutAfter(rng.gen_range(0, config.cut_point_max)));
    }
    None
}

impl<T: SearchTransport> SearchTransport for SimulatedTransport<T> {
    fn open<'a>(
        &'a self,
        author: &'a str,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = Result<RecordStream, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let (fault, latency) = self.next_fault();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            match fault {
                Some(Fault::ConnectRefused) => {
                    Err(TransportError::retryable("simulated connection refused"))
                }
                Some(Fault::Timeout) => Err(TransportError::retryable("simulated timeout")),
                Some(Fault::ServerError) => {
                    Err(TransportError::from_status(500, "simulated server error"))
                }
                Some(Fault::BadRequest) => {
                    Err(TransportError::from_status(400, "simulated bad request"))
                }
                Some(Fault::CutAfter(n)) => {
                    let records = self.inner.open(author, ctx).await?;
                    let reset = TransportError::retryable("simulated connection reset");
                    Ok(records
                        .take(n as usize)
                        .chain(stream::once(async move { Err(reset) }))
                        .boxed())
                }
                Some(Fault::Corrupt(n)) => {
                    let records = self.inner.open(author, ctx).await?;
                    let corrupt =
                        TransportError::fatal("Malformed wire record: simulated corruption");
                    Ok(records
                        .take(n as usize)
                        .chain(stream::once(async move { Err(corrupt) }))
                        .boxed())
                }
                None => self.inner.open(author, ctx).await,
            }
        })
    }
}
