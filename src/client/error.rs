//! Failure classification for remote searches
//!
//! Transports never hand back a bare error: every failure carries an
//! `ErrorClass` that drives the retry state machine.

use crate::catalog::PipelineError;
use crate::wire::WireError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Timeouts, connection failures, server errors
    Retryable,
    /// The provider rejected the request itself
    NonRetryable,
    /// The call cannot produce a trustworthy result; surfaced to the consumer
    Fatal,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Retryable => write!(f, "retryable"),
            ErrorClass::NonRetryable => write!(f, "non-retryable"),
            ErrorClass::Fatal => write!(f, "fatal"),
        }
    }
}

/// Classify an HTTP status that is not a success.
///
/// 4xx is the provider rejecting the query, except 408 and 429 which are
/// load conditions. 507 is the provider failing to allocate the corpus.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        408 | 429 => ErrorClass::Retryable,
        400..=499 => ErrorClass::NonRetryable,
        507 => ErrorClass::Fatal,
        _ => ErrorClass::Retryable,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub class: ErrorClass,
    pub message: String,
}

impl TransportError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        TransportError {
            class,
            message: message.into(),
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Retryable, message)
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NonRetryable, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Fatal, message)
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };
        Self::new(classify_status(status), message)
    }

    pub fn is_retryable(&self) -> bool {
        self.class == ErrorClass::Retryable
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.class)
    }
}

impl std::error::Error for TransportError {}

impl From<WireError> for TransportError {
    fn from(e: WireError) -> Self {
        TransportError::fatal(e.to_string())
    }
}

impl From<PipelineError> for TransportError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Worker(_) => TransportError::retryable(e.to_string()),
            PipelineError::Generate(_) | PipelineError::Codec { .. } => {
                TransportError::fatal(e.to_string())
            }
        }
    }
}

/// A fatal failure that ended a search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    pub message: String,
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Search failed: {}", self.message)
    }
}

impl std::error::Error for SearchError {}

impl From<TransportError> for SearchError {
    fn from(e: TransportError) -> Self {
        SearchError { message: e.message }
    }
}
