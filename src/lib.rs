pub mod assembler;
pub mod challenge;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod reporter;
pub mod retry;
pub mod selector;
pub mod source;
pub mod store;
pub mod trend;

pub use assembler::SnapshotAssembler;
pub use client::ClientKind;
pub use error::{Error, Result};
pub use fetcher::{Fetcher, FetcherOptions, Strategy};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use model::{ClientData, NodeCounts};
pub use reporter::{Reporter, ReporterState, RunSettings, RunSummary};
pub use source::{Source, SourceKind};
