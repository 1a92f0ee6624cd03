pub mod catalog;
pub mod client;
pub mod diagnostics;
pub mod gateway;
pub mod observability;
pub mod server;
pub mod wire;

pub use catalog::{Book, CatalogConfig, CorpusGenerator, SearchPipeline};
pub use client::{BookClient, ClientConfig, HttpTransport, RetryPolicy, SearchTransport};
pub use diagnostics::{CallEvent, CallOutcome, RequestContext};
pub use gateway::{BookGateway, GatewayConfig};
pub use server::BookService;
