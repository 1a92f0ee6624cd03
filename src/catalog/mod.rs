//! Provider-side catalog
//!
//! ```text
//! CorpusGenerator → codec round trip → AuthorMatcher → SearchIter / CatalogStream
//! ```
//!
//! Each search regenerates the corpus from its seed unless
//! `CatalogConfig::cache_corpus` is set.

pub mod book;
pub mod codec;
pub mod config;
pub mod generator;
pub mod matcher;
pub mod pipeline;
pub mod rng;

pub use book::Book;
pub use codec::CodecError;
pub use config::CatalogConfig;
pub use generator::{CorpusGenerator, GenerateError, AUTHORS, GENRES};
pub use matcher::AuthorMatcher;
pub use pipeline::{CatalogStream, PipelineError, SearchIter, SearchPipeline};
pub use rng::DeterministicRng;
