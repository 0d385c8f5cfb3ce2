use super::{Record, Store};
use crate::client::ClientKind;
use crate::error::{Error, Result};
use crate::model::ClientData;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::PathBuf;

pub struct SqliteStore {
    pool: SqlitePool,
    table_name: String,
    initialized: bool,
}

impl SqliteStore {
    pub async fn new(path: PathBuf, table_name: String) -> Result<Self> {
        if table_name.is_empty() || !table_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Config(format!("invalid table name: {:?}", table_name)));
        }

        let conn_str = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&conn_str).await?;

        Ok(Self {
            pool,
            table_name,
            initialized: false,
        })
    }

    async fn ensure_table(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let query = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                client TEXT NOT NULL,
                total INTEGER NOT NULL,
                client_total INTEGER NOT NULL,
                total_synced INTEGER NOT NULL,
                client_synced INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            self.table_name
        );
        sqlx::query(&query).execute(&self.pool).await?;

        self.initialized = true;
        Ok(())
    }
}

fn count(row: &SqliteRow, column: &str) -> Result<u64> {
    let value: i64 = row.try_get(column)?;
    u64::try_from(value).map_err(|_| Error::Invariant(format!("negative {} in stored row: {}", column, value)))
}

fn row_to_record(row: &SqliteRow) -> Result<Record> {
    let client: String = row.try_get("client")?;
    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Invariant(format!("bad timestamp {:?}: {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(Record {
        source: row.try_get("source")?,
        client: client.parse()?,
        total: count(row, "total")?,
        client_total: count(row, "client_total")?,
        total_synced: count(row, "total_synced")?,
        client_synced: count(row, "client_synced")?,
        created_at,
    })
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::Invariant(format!("count {} does not fit the store", value)))
}

#[async_trait]
impl Store for SqliteStore {
    async fn append(&mut self, data: &ClientData) -> Result<()> {
        self.ensure_table().await?;

        let query = format!(
            "INSERT INTO {} (source, client, total, client_total, total_synced, client_synced, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.table_name
        );
        sqlx::query(&query)
            .bind(data.source())
            .bind(data.client().id())
            .bind(to_i64(data.total())?)
            .bind(to_i64(data.client_total())?)
            .bind(to_i64(data.total_synced())?)
            .bind(to_i64(data.client_synced())?)
            .bind(data.created_at().to_rfc3339_opts(SecondsFormat::Micros, true))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_latest(
        &mut self,
        source: &str,
        client: ClientKind,
        limit: usize,
    ) -> Result<Vec<ClientData>> {
        self.ensure_table().await?;

        let query = format!(
            "SELECT source, client, total, client_total, total_synced, client_synced, created_at
             FROM {} WHERE source = ?1 AND client = ?2
             ORDER BY created_at DESC, id DESC LIMIT ?3",
            self.table_name
        );
        let rows = sqlx::query(&query)
            .bind(source)
            .bind(client.id())
            .bind(to_i64(limit as u64)?)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row_to_record(row).and_then(ClientData::try_from))
            .collect()
    }

    async fn close(&mut self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
