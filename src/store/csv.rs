use super::{latest_of, Record, Store};
use crate::client::ClientKind;
use crate::error::Result;
use crate::model::ClientData;
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

/// Appends measurements to a CSV file, writing the header row once.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    fn is_empty(&self) -> bool {
        fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true)
    }
}

#[async_trait]
impl Store for CsvStore {
    async fn append(&mut self, data: &ClientData) -> Result<()> {
        let write_headers = self.is_empty();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_headers)
            .from_writer(file);
        writer.serialize(Record::from(data))?;
        writer.flush()?;
        Ok(())
    }

    async fn query_latest(
        &mut self,
        source: &str,
        client: ClientKind,
        limit: usize,
    ) -> Result<Vec<ClientData>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<Record>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        latest_of(records, source, client, limit)
    }
}
