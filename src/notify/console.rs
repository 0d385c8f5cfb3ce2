use super::Notifier;
use crate::error::{Error, Result};
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::sync::Arc;

/// Prints the report to stdout, above any active progress bars.
pub struct ConsoleNotifier {
    multi: Option<Arc<MultiProgress>>,
}

impl ConsoleNotifier {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new(None)
    }
}

fn render(source_name: &str, report_text: &str, chart_image_url: &str) -> String {
    format!(
        "[{}]\n{}\nChart: {}",
        source_name, report_text, chart_image_url
    )
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn post_report(&self, source_name: &str, report_text: &str, chart_image_url: &str) -> Result<()> {
        let output = render(source_name, report_text, chart_image_url);

        if let Some(multi) = &self.multi {
            for line in output.lines() {
                multi.println(line).map_err(|e| Error::Notify(e.to_string()))?;
            }
        } else {
            for line in output.lines() {
                println!("{}", line);
            }
        }
        Ok(())
    }
}
