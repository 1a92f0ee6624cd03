//! Retry policy and per-call state machine
//!
//! ```text
//!            ┌── retryable, n < max ── sleep(base·2ⁿ) ──┐
//!            ▼                                            │
//! Attempting(n) ───────────────────────────────────────────┘
//!    │ success            → Success
//!    │ non-retryable      → FailedTerminal
//!    │ retryable, n = max → FailedExhausted
//!    │ fatal              → Fatal
//! ```
//!
//! Terminal states never transition again.

use super::error::ErrorClass;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            base_delay,
        }
    }

    /// Delay before the attempt following failed attempt `attempt`:
    /// `base_delay · 2^attempt`, saturating.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).unwrap_or(Duration::MAX)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Success,
    FailedTerminal,
    FailedExhausted,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { next_attempt: u32, delay: Duration },
    Stop(RetryState),
}

impl RetryState {
    pub fn initial() -> Self {
        RetryState::Attempting(0)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }

    pub fn on_success(self) -> RetryState {
        match self {
            RetryState::Attempting(_) => RetryState::Success,
            terminal => terminal,
        }
    }

    pub fn on_failure(self, class: ErrorClass, policy: &RetryPolicy) -> RetryDecision {
        let attempt = match self {
            RetryState::Attempting(n) => n,
            terminal => return RetryDecision::Stop(terminal),
        };

        match class {
            ErrorClass::Fatal => RetryDecision::Stop(RetryState::Fatal),
            ErrorClass::NonRetryable => RetryDecision::Stop(RetryState::FailedTerminal),
            ErrorClass::Retryable if attempt >= policy.max_retries => {
                RetryDecision::Stop(RetryState::FailedExhausted)
            }
            ErrorClass::Retryable => RetryDecision::Retry {
                next_attempt: attempt + 1,
                delay: policy.delay_for(attempt),
            },
        }
    }
}

/// Time seam for backoff waits
pub trait Sleeper: Send + Sync + 'static {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Suspends the task on the tokio timer; no thread is held.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// Returns immediately and remembers what it was asked to wait
#[derive(Debug, Clone, Default)]
pub struct ImmediateSleeper {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl ImmediateSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().clone()
    }
}

impl Sleeper for ImmediateSleeper {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.requested.lock().push(delay);
        Box::pin(std::future::ready(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100))
    }

    #[test]
    fn test_delays_double() {
        let p = policy();
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_saturates() {
        let p = RetryPolicy::new(100, Duration::from_secs(1));
        assert!(p.delay_for(40) >= p.delay_for(31));
        let huge = RetryPolicy::new(1, Duration::MAX);
        assert_eq!(huge.delay_for(5), Duration::MAX);
    }

    #[test]
    fn test_retry_until_exhausted() {
        let p = policy();
        let mut state = RetryState::initial();
        let mut delays = Vec::new();
        loop {
            match state.on_failure(ErrorClass::Retryable, &p) {
                RetryDecision::Retry { next_attempt, delay } => {
                    delays.push(delay);
                    state = RetryState::Attempting(next_attempt);
                }
                RetryDecision::Stop(end) => {
                    assert_eq!(end, RetryState::FailedExhausted);
                    break;
                }
            }
        }
        assert_eq!(delays.len() as u32, p.max_retries);
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }

    #[test]
    fn test_non_retryable_stops_immediately() {
        assert_eq!(
            RetryState::initial().on_failure(ErrorClass::NonRetryable, &policy()),
            RetryDecision::Stop(RetryState::FailedTerminal)
        );
    }

    #[test]
    fn test_fatal_stops_immediately() {
        assert_eq!(
            RetryState::Attempting(1).on_failure(ErrorClass::Fatal, &policy()),
            RetryDecision::Stop(RetryState::Fatal)
        );
    }

    #[test]
    fn test_zero_retries() {
        let p = RetryPolicy::new(0, Duration::from_millis(5));
        assert_eq!(p.max_attempts(), 1);
        assert_eq!(
            RetryState::initial().on_failure(ErrorClass::Retryable, &p),
            RetryDecision::Stop(RetryState::FailedExhausted)
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [
            RetryState::Success,
            RetryState::FailedTerminal,
            RetryState::FailedExhausted,
            RetryState::Fatal,
        ] {
            assert!(terminal.is_terminal());
            assert_eq!(terminal.on_success(), terminal);
            assert_eq!(
                terminal.on_failure(ErrorClass::Retryable, &policy()),
                RetryDecision::Stop(terminal)
            );
        }
        assert_eq!(RetryState::Attempting(2).on_success(), RetryState::Success);
    }

    #[tokio::test]
    async fn test_immediate_sleeper_records() {
        let sleeper = ImmediateSleeper::new();
        sleeper.sleep(Duration::from_millis(10)).await;
        sleeper.sleep(Duration::from_millis(20)).await;
        assert_eq!(
            sleeper.requested(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }
}
