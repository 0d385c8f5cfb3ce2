pub mod collector;
pub mod snapshot;

pub use collector::{AttemptOutcome, MetricsCollector};
pub use snapshot::MetricsSnapshot;
