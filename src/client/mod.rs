//! Caller-side search client
//!
//! `BookClient` issues a streaming search through a `SearchTransport`,
//! retries classified-retryable failures with exponential backoff and
//! degrades to an empty result when the provider rejects the query or the
//! retry budget runs out.

pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod service;
pub mod simulated;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use error::{classify_status, ErrorClass, SearchError, TransportError};
pub use http::{HttpTransport, SEARCH_PATH};
pub use retry::{ImmediateSleeper, RetryDecision, RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use service::{BookClient, BookStream, DEFAULT_MIN_YEAR};
pub use simulated::{Fault, SimulatedTransport, SimulatedTransportConfig, SimulatedTransportStats};
pub use transport::{LocalTransport, RecordStream, SearchTransport};
