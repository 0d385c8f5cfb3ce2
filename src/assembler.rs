use crate::client::ClientKind;
use crate::error::{Error, Result};
use crate::extract::Tally;
use crate::fetcher::Fetcher;
use crate::model::{ClientData, NodeCounts};
use crate::source::{Source, ViewPlan};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Drives the fetcher over a source's views and produces one measurement.
pub struct SnapshotAssembler<'a> {
    source: &'a Source,
    fetcher: &'a Fetcher,
    concurrent_views: bool,
}

impl<'a> SnapshotAssembler<'a> {
    pub fn new(source: &'a Source, fetcher: &'a Fetcher, concurrent_views: bool) -> Self {
        Self {
            source,
            fetcher,
            concurrent_views,
        }
    }

    /// Acquires every view the source needs; any failure yields no measurement.
    pub async fn acquire(&self, client: ClientKind, cancel: &CancellationToken) -> Result<ClientData> {
        let counts = match &self.source.views {
            ViewPlan::SyncedSplit {
                synced_paths,
                unsynced_paths,
            } => {
                let synced_urls = self.source.candidate_urls(synced_paths);
                let unsynced_urls = self.source.candidate_urls(unsynced_paths);
                let (synced, unsynced) = if self.concurrent_views {
                    // Dropping the slower future on first error cancels its request.
                    tokio::try_join!(
                        self.fetcher.fetch(&synced_urls, client, cancel),
                        self.fetcher.fetch(&unsynced_urls, client, cancel),
                    )?
                } else {
                    let synced = self.fetcher.fetch(&synced_urls, client, cancel).await?;
                    let unsynced = self.fetcher.fetch(&unsynced_urls, client, cancel).await?;
                    (synced, unsynced)
                };
                log::debug!("Synced view {:?}, unsynced view {:?}", synced, unsynced);
                combine_split(synced, unsynced)?
            }
            ViewPlan::Combined { paths } => {
                let urls = self.source.candidate_urls(paths);
                let tally = self.fetcher.fetch(&urls, client, cancel).await?;
                combine_single(tally)
            }
        };

        ClientData::new(self.source.kind.tag(), client, counts, Utc::now())
    }
}

/// Sums the synced and unsynced listings of one site.
pub fn combine_split(synced: Tally, unsynced: Tally) -> Result<NodeCounts> {
    let sum = |a: u64, b: u64, what: &str| {
        a.checked_add(b)
            .ok_or_else(|| Error::Invariant(format!("{} overflows: {} + {}", what, a, b)))
    };
    Ok(NodeCounts {
        total: sum(synced.total, unsynced.total, "total")?,
        client_total: sum(synced.client, unsynced.client, "client total")?,
        total_synced: synced.total,
        client_synced: synced.client,
    })
}

/// A combined listing only shows synced nodes, so every node counts as synced.
pub fn combine_single(tally: Tally) -> NodeCounts {
    NodeCounts {
        total: tally.total,
        client_total: tally.client,
        total_synced: tally.total,
        client_synced: tally.client,
    }
}
