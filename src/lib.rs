pub mod models;
pub mod error;
pub mod config;
pub mod allocator;
pub mod parsers;
pub mod mutator;
pub mod injector;
pub mod sink;
pub mod engine;

// Re-export commonly used items
pub use models::*;
pub use error::{CanaryError, CanaryResult};
pub use config::Settings;
pub use allocator::TokenAllocator;
pub use parsers::{BareUrlParser, LineParser, RawRequestParser, RequestTarget};
pub use mutator::{QueryMutator, QueryParams};
pub use injector::CanaryInjector;
pub use sink::{OutputSink, SinkParts};
pub use engine::{InjectionEngine, RunSummary, DEFAULT_CONCURRENCY};
