use crate::client::ClientKind;
use crate::source::SourceKind;
use crate::trend::chart::DEFAULT_CHART_ENDPOINT;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReporterConfig {
    #[serde(default)]
    pub source: SourceKind,

    #[serde(default)]
    pub client: ClientKind,

    /// Replaces the source's default base URLs when non-empty
    #[serde(default)]
    pub base_urls: Vec<String>,

    #[serde(default = "default_max_retries")]
    #[validate(range(max = 10))]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_attempt_delay")]
    pub attempt_delay_ms: u64,

    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,

    /// Overall budget for one run; unset means no deadline
    #[serde(default)]
    pub deadline_secs: Option<u64>,

    #[serde(default)]
    pub concurrent_views: bool,

    #[serde(default = "default_history_limit")]
    #[validate(range(min = 1, max = 100))]
    pub history_limit: usize,

    #[serde(default)]
    pub skip_update: bool,

    #[serde(default)]
    pub challenge_markers: Vec<String>,

    #[serde(default = "default_chart_url")]
    #[validate(url)]
    pub chart_url: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            client: ClientKind::default(),
            base_urls: Vec::new(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            attempt_delay_ms: default_attempt_delay(),
            request_timeout_secs: default_request_timeout(),
            deadline_secs: None,
            concurrent_views: false,
            history_limit: default_history_limit(),
            skip_update: false,
            challenge_markers: Vec::new(),
            chart_url: default_chart_url(),
            store: StoreConfig::default(),
            notifier: NotifierConfig::default(),
            extends: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Sqlite {
        path: String,
        #[serde(default = "default_table_name")]
        table: String,
    },
    Json {
        path: String,
    },
    Csv {
        path: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite {
            path: "census.db".to_string(),
            table: default_table_name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifierConfig {
    #[default]
    Console,
    Slack {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        api_url: Option<String>,
    },
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_attempt_delay() -> u64 {
    2000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_history_limit() -> usize {
    35
}

fn default_chart_url() -> String {
    DEFAULT_CHART_ENDPOINT.to_string()
}

fn default_table_name() -> String {
    "client_data".to_string()
}
