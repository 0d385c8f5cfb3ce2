use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to parse {label} count {raw:?}: {source}")]
    Parse {
        label: String,
        raw: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("incomplete data from {url}: total={total:?}, client={client:?}")]
    Incomplete {
        url: String,
        total: Option<u64>,
        client: Option<u64>,
    },

    #[error("exhausted all {endpoints} endpoints without a complete result")]
    Exhausted { endpoints: usize },

    #[error("data integrity violation: {0}")]
    Invariant(String),

    #[error("history is empty, nothing to report")]
    EmptyHistory,

    #[error("cannot compute a percentage: {0} is zero")]
    ZeroDenominator(&'static str),

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("environment error: {0}")]
    Environment(#[from] config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Transient failures worth another attempt against the same endpoint.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Error::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
