use crate::client::ClientKind;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four node counts of one census sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub total: u64,
    pub client_total: u64,
    pub total_synced: u64,
    pub client_synced: u64,
}

impl NodeCounts {
    pub fn validate(&self) -> Result<()> {
        if self.client_total > self.total {
            return Err(Error::Invariant(format!(
                "client total {} exceeds total {}",
                self.client_total, self.total
            )));
        }
        if self.total_synced > self.total {
            return Err(Error::Invariant(format!(
                "synced total {} exceeds total {}",
                self.total_synced, self.total
            )));
        }
        if self.client_synced > self.total_synced {
            return Err(Error::Invariant(format!(
                "client synced {} exceeds synced total {}",
                self.client_synced, self.total_synced
            )));
        }
        if self.client_synced > self.client_total {
            return Err(Error::Invariant(format!(
                "client synced {} exceeds client total {}",
                self.client_synced, self.client_total
            )));
        }
        Ok(())
    }
}

/// One immutable, timestamped census measurement for a (source, client) pair.
///
/// Only constructible through [`ClientData::new`], which enforces the count
/// invariants, so every value in circulation is safe to persist or report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientData {
    source: String,
    client: ClientKind,
    counts: NodeCounts,
    created_at: DateTime<Utc>,
}

impl ClientData {
    pub fn new(
        source: impl Into<String>,
        client: ClientKind,
        counts: NodeCounts,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        counts.validate()?;
        Ok(Self {
            source: source.into(),
            client,
            counts,
            created_at,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn client(&self) -> ClientKind {
        self.client
    }

    pub fn counts(&self) -> NodeCounts {
        self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.total
    }

    pub fn client_total(&self) -> u64 {
        self.counts.client_total
    }

    pub fn total_synced(&self) -> u64 {
        self.counts.total_synced
    }

    pub fn client_synced(&self) -> u64 {
        self.counts.client_synced
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
