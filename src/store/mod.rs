use crate::client::ClientKind;
use crate::error::{Error, Result};
use crate::model::{ClientData, NodeCounts};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod csv;
pub mod json;
pub mod sqlite;

pub use self::csv::CsvStore;
pub use self::json::JsonLinesStore;
pub use self::sqlite::SqliteStore;

/// Append-only log of measurements.
#[async_trait]
pub trait Store: Send + Sync {
    async fn append(&mut self, data: &ClientData) -> Result<()>;

    /// Up to `limit` measurements for the pair, most recent first.
    async fn query_latest(
        &mut self,
        source: &str,
        client: ClientKind,
        limit: usize,
    ) -> Result<Vec<ClientData>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Flat on-disk row shared by the file backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub source: String,
    pub client: ClientKind,
    pub total: u64,
    pub client_total: u64,
    pub total_synced: u64,
    pub client_synced: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&ClientData> for Record {
    fn from(data: &ClientData) -> Self {
        Self {
            source: data.source().to_string(),
            client: data.client(),
            total: data.total(),
            client_total: data.client_total(),
            total_synced: data.total_synced(),
            client_synced: data.client_synced(),
            created_at: data.created_at(),
        }
    }
}

impl TryFrom<Record> for ClientData {
    type Error = Error;

    fn try_from(record: Record) -> Result<Self> {
        ClientData::new(
            record.source,
            record.client,
            NodeCounts {
                total: record.total,
                client_total: record.client_total,
                total_synced: record.total_synced,
                client_synced: record.client_synced,
            },
            record.created_at,
        )
    }
}

/// Keeps the newest `limit` records for the pair, most recent first.
fn latest_of(records: Vec<Record>, source: &str, client: ClientKind, limit: usize) -> Result<Vec<ClientData>> {
    let mut matching: Vec<_> = records
        .into_iter()
        .filter(|r| r.source == source && r.client == client)
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    matching
        .into_iter()
        .take(limit)
        .map(ClientData::try_from)
        .collect()
}
