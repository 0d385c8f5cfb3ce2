use crate::error::Result;
use async_trait::async_trait;

pub mod console;
pub mod slack;

pub use console::ConsoleNotifier;
pub use slack::SlackNotifier;

/// Destination for the finished trend report.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_report(&self, source_name: &str, report_text: &str, chart_image_url: &str) -> Result<()>;
}
