use crate::error::{Error, Result};
use crate::extract::{Extractor, PatternTextExtractor, StructuredGroupExtractor};
use crate::fetcher::{Strategy, ALTERNATE_USER_AGENTS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported census websites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Ethernets,
    Ethernodes,
}

impl SourceKind {
    /// Tag stored alongside every measurement.
    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Ethernets => "ethernets",
            SourceKind::Ethernodes => "ethernodes",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Ethernets => "Ethernets",
            SourceKind::Ethernodes => "Ethernodes",
        }
    }

    pub fn default_base_urls(&self) -> Vec<String> {
        match self {
            SourceKind::Ethernets => vec!["https://www.ethernets.io".to_string()],
            SourceKind::Ethernodes => vec![
                "https://ethernodes.org".to_string(),
                "https://www.ethernodes.org".to_string(),
            ],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethernets" => Ok(SourceKind::Ethernets),
            "ethernodes" => Ok(SourceKind::Ethernodes),
            _ => Err(Error::Config(format!("invalid source: \"{}\"", s))),
        }
    }
}

/// Which filtered pages make up one measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPlan {
    /// Separate synced and unsynced listings whose counts are summed.
    SyncedSplit {
        synced_paths: Vec<String>,
        unsynced_paths: Vec<String>,
    },
    /// One listing whose nodes all count as synced.
    Combined { paths: Vec<String> },
}

/// Everything needed to scrape one site.
#[derive(Clone)]
pub struct Source {
    pub kind: SourceKind,
    pub base_urls: Vec<String>,
    pub views: ViewPlan,
    pub extractor: Arc<dyn Extractor>,
    pub strategies: Vec<Strategy>,
}

impl Source {
    /// Builds the site definition; an empty `base_urls` selects the defaults.
    pub fn new(kind: SourceKind, base_urls: &[String]) -> Result<Self> {
        let base_urls = if base_urls.is_empty() {
            kind.default_base_urls()
        } else {
            base_urls.to_vec()
        };
        for base in &base_urls {
            url::Url::parse(base)?;
        }

        let source = match kind {
            SourceKind::Ethernets => Source {
                kind,
                base_urls,
                views: ViewPlan::SyncedSplit {
                    synced_paths: vec!["/?synced=yes".to_string()],
                    unsynced_paths: vec!["/?synced=no".to_string()],
                },
                extractor: Arc::new(PatternTextExtractor::ethernets()?),
                strategies: vec![Strategy::Direct],
            },
            SourceKind::Ethernodes => Source {
                kind,
                base_urls,
                views: ViewPlan::Combined {
                    paths: ["/", "/stats", "/api/stats", "/data"]
                        .iter()
                        .map(|p| p.to_string())
                        .collect(),
                },
                extractor: Arc::new(StructuredGroupExtractor::ethernodes()),
                strategies: std::iter::once(Strategy::Direct)
                    .chain(
                        ALTERNATE_USER_AGENTS
                            .iter()
                            .map(|ua| Strategy::Browser { user_agent: *ua }),
                    )
                    .collect(),
            },
        };
        Ok(source)
    }

    pub fn name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Candidate URLs for `paths`, every path on the primary base first.
    pub fn candidate_urls(&self, paths: &[String]) -> Vec<String> {
        self.base_urls
            .iter()
            .flat_map(|base| {
                let base = base.trim_end_matches('/');
                paths.iter().map(move |path| format!("{}{}", base, path))
            })
            .collect()
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("kind", &self.kind)
            .field("base_urls", &self.base_urls)
            .field("views", &self.views)
            .field("strategies", &self.strategies)
            .finish()
    }
}
