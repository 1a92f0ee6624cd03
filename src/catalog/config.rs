//! Provider configuration
//!
//! Loaded from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | BOOK_SERVICE_ADDR | 0.0.0.0:8081 | Listen address |
//! | BOOK_SERVICE_SEED | 42 | Corpus seed |
//! | BOOK_SERVICE_CORPUS_SIZE | 200000 | Books generated per request |
//! | BOOK_SERVICE_CACHE_CORPUS | false | Reuse one corpus across requests |
//! | BOOK_SERVICE_STREAM_BUFFER | 256 | Matches buffered ahead of a slow reader |
//! | BOOK_SERVICE_MAX_QUERY_CHARS | 256 | Longer queries are rejected with 400 |

use super::generator::{CorpusGenerator, CORPUS_SIZE_DEFAULT, SEED_DEFAULT};
use serde::{Deserialize, Serialize};

const DEFAULT_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_STREAM_BUFFER: usize = 256;
const DEFAULT_MAX_QUERY_CHARS: usize = 256;

// Explicit limits with _MAX suffix
const CORPUS_SIZE_MAX: usize = 50_000_000;
const STREAM_BUFFER_MAX: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub listen_addr: String,
    pub seed: u64,
    pub corpus_size: usize,
    /// Keep the generated corpus between requests instead of regenerating it
    pub cache_corpus: bool,
    /// Capacity of the channel between the scan worker and the response body
    pub stream_buffer: usize,
    pub max_query_chars: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            listen_addr: DEFAULT_ADDR.to_string(),
            seed: SEED_DEFAULT,
            corpus_size: CORPUS_SIZE_DEFAULT,
            cache_corpus: false,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        CatalogConfig {
            listen_addr: std::env::var("BOOK_SERVICE_ADDR").unwrap_or(defaults.listen_addr),
            seed: env_parse("BOOK_SERVICE_SEED").unwrap_or(defaults.seed),
            corpus_size: env_parse("BOOK_SERVICE_CORPUS_SIZE")
                .unwrap_or(defaults.corpus_size)
                .min(CORPUS_SIZE_MAX),
            cache_corpus: std::env::var("BOOK_SERVICE_CACHE_CORPUS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.cache_corpus),
            stream_buffer: env_parse("BOOK_SERVICE_STREAM_BUFFER")
                .unwrap_or(defaults.stream_buffer)
                .clamp(1, STREAM_BUFFER_MAX),
            max_query_chars: env_parse("BOOK_SERVICE_MAX_QUERY_CHARS")
                .unwrap_or(defaults.max_query_chars),
        }
    }

    /// Small corpus for tests
    pub fn test() -> Self {
        CatalogConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            corpus_size: 2_000,
            stream_buffer: 16,
            ..Self::default()
        }
    }

    pub fn generator(&self) -> CorpusGenerator {
        CorpusGenerator::new(self.seed, self.corpus_size)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
