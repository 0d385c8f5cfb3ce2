use super::Notifier;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_SLACK_API: &str = "https://slack.com/api";

/// Posts reports to a Slack channel through `chat.postMessage`.
pub struct SlackNotifier {
    client: Client,
    api_url: String,
    token: String,
    channel: String,
}

#[derive(Debug, Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(token: String, channel: String, api_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_url: api_url.unwrap_or_else(|| DEFAULT_SLACK_API.to_string()),
            token,
            channel,
        })
    }

    fn message(&self, source_name: &str, report_text: &str, chart_image_url: &str) -> Value {
        let caption = format!("{} client nodes", source_name);
        json!({
            "channel": self.channel,
            "text": report_text,
            "blocks": [
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": report_text }
                },
                {
                    "type": "image",
                    "block_id": "quickchart-image",
                    "image_url": chart_image_url,
                    "alt_text": caption,
                    "title": { "type": "plain_text", "text": caption }
                }
            ]
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_report(&self, source_name: &str, report_text: &str, chart_image_url: &str) -> Result<()> {
        let url = format!("{}/chat.postMessage", self.api_url.trim_end_matches('/'));
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&self.message(source_name, report_text, chart_image_url))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Notify(format!("Slack answered HTTP {}", status)));
        }

        let reply: SlackReply = res.json().await?;
        log::debug!("Slack message sent: ok={}", reply.ok);
        if !reply.ok {
            return Err(Error::Notify(format!(
                "failed to send message: {}",
                reply.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        Ok(())
    }
}
