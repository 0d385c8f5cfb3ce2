use crate::challenge::ChallengeDetector;
use crate::config::schema::{NotifierConfig, ReporterConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::fetcher::FetcherOptions;
use crate::notify::{ConsoleNotifier, Notifier, SlackNotifier};
use crate::retry::RetryPolicy;
use crate::source::Source;
use crate::store::{CsvStore, JsonLinesStore, SqliteStore, Store};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Prefix of the environment variables that carry credentials.
pub const ENV_PREFIX: &str = "REPORTER";

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ReporterConfig> {
        let path = path.as_ref();
        let mut visited = HashSet::new();
        let merged = Self::load_with_inheritance(path, &mut visited)?;
        let config: ReporterConfig = serde_json::from_value(merged)?;
        Self::finalize(config)
    }

    /// Loads `path` when given, otherwise starts from the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<ReporterConfig> {
        match path {
            Some(path) => Self::load(path),
            None => Self::finalize(ReporterConfig::default()),
        }
    }

    fn finalize(mut config: ReporterConfig) -> Result<ReporterConfig> {
        let env = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Self::apply_env(&mut config, &env);
        Self::check(&config)?;
        Ok(config)
    }

    /// Fills missing Slack credentials from `REPORTER_SLACK_APP_TOKEN` and
    /// `REPORTER_SLACK_CHANNEL`.
    pub fn apply_env(config: &mut ReporterConfig, env: &::config::Config) {
        if let NotifierConfig::Slack { token, channel, .. } = &mut config.notifier {
            if token.is_none() {
                *token = env.get_string("slack_app_token").ok();
            }
            if channel.is_none() {
                *channel = env.get_string("slack_channel").ok();
            }
        }
    }

    /// Field validation plus the cross-field rules serde cannot express.
    pub fn check(config: &ReporterConfig) -> Result<()> {
        config.validate()?;
        if let NotifierConfig::Slack { token, channel, .. } = &config.notifier {
            if token.as_deref().map_or(true, str::is_empty) {
                return Err(Error::Config(format!(
                    "slack app token is required (environment variable: {}_SLACK_APP_TOKEN)",
                    ENV_PREFIX
                )));
            }
            if channel.as_deref().map_or(true, str::is_empty) {
                return Err(Error::Config(format!(
                    "slack channel is required (environment variable: {}_SLACK_CHANNEL)",
                    ENV_PREFIX
                )));
            }
        }
        Ok(())
    }

    fn load_with_inheritance(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Value> {
        let path = fs::canonicalize(path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if visited.contains(&path) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }
        visited.insert(path.clone());

        let mut config = Self::load_file(&path)?;

        let parent_ref = config
            .get("extends")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(parent_path_str) = parent_ref {
            let parent_path = path
                .parent()
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Cannot determine parent directory for {}",
                        path.display()
                    ))
                })?
                .join(parent_path_str);

            let parent = Self::load_with_inheritance(&parent_path, visited)?;
            config = Self::merge_values(parent, config);
        }

        if let Value::Object(map) = &mut config {
            map.remove("extends");
        }
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported file extension: {}",
                    path.display()
                )))
            }
        };

        match value {
            Value::Object(_) => Ok(value),
            Value::Null => Ok(Value::Object(Default::default())),
            _ => Err(Error::Config(format!(
                "{}: top level must be a mapping",
                path.display()
            ))),
        }
    }

    /// Child keys win; nested tables merge key by key, except tagged
    /// variants (`type`) which are replaced whole.
    fn merge_values(parent: Value, child: Value) -> Value {
        match (parent, child) {
            (Value::Object(mut parent), Value::Object(child)) => {
                for (key, value) in child {
                    let merged = match parent.remove(&key) {
                        Some(existing) if Self::same_variant(&existing, &value) => {
                            Self::merge_values(existing, value)
                        }
                        _ => value,
                    };
                    parent.insert(key, merged);
                }
                Value::Object(parent)
            }
            (_, child) => child,
        }
    }

    fn same_variant(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(a), Value::Object(b)) => match (a.get("type"), b.get("type")) {
                (Some(x), Some(y)) => x == y,
                (None, _) | (_, None) => true,
            },
            _ => false,
        }
    }

    pub fn source(config: &ReporterConfig) -> Result<Source> {
        Source::new(config.source, &config.base_urls)
    }

    pub fn fetcher_options(config: &ReporterConfig) -> FetcherOptions {
        FetcherOptions {
            retry: RetryPolicy::new(config.max_retries, Duration::from_millis(config.retry_delay_ms)),
            attempt_delay: Duration::from_millis(config.attempt_delay_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            detector: ChallengeDetector::new().with_markers(config.challenge_markers.iter().cloned()),
        }
    }

    pub async fn create_store(config: &StoreConfig) -> Result<Box<dyn Store>> {
        let store: Box<dyn Store> = match config {
            StoreConfig::Sqlite { path, table } => {
                Box::new(SqliteStore::new(PathBuf::from(path), table.clone()).await?)
            }
            StoreConfig::Json { path } => Box::new(JsonLinesStore::new(PathBuf::from(path))?),
            StoreConfig::Csv { path } => Box::new(CsvStore::new(PathBuf::from(path))?),
        };
        Ok(store)
    }

    pub fn create_notifier(
        config: &NotifierConfig,
        multi: Option<Arc<indicatif::MultiProgress>>,
    ) -> Result<Box<dyn Notifier>> {
        let notifier: Box<dyn Notifier> = match config {
            NotifierConfig::Console => Box::new(ConsoleNotifier::new(multi)),
            NotifierConfig::Slack {
                token,
                channel,
                api_url,
            } => {
                let (Some(token), Some(channel)) = (token.clone(), channel.clone()) else {
                    return Err(Error::Config("slack notifier needs a token and a channel".to_string()));
                };
                Box::new(SlackNotifier::new(token, channel, api_url.clone())?)
            }
        };
        Ok(notifier)
    }
}
