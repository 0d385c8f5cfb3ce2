use super::{latest_of, Record, Store};
use crate::client::ClientKind;
use crate::error::Result;
use crate::model::ClientData;
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// One JSON object per line, appended in arrival order.
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    fn read_all(&self) -> Result<Vec<Record>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl Store for JsonLinesStore {
    async fn append(&mut self, data: &ClientData) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        serde_json::to_writer(&mut file, &Record::from(data))?;
        writeln!(file)?;
        Ok(())
    }

    async fn query_latest(
        &mut self,
        source: &str,
        client: ClientKind,
        limit: usize,
    ) -> Result<Vec<ClientData>> {
        latest_of(self.read_all()?, source, client, limit)
    }
}
