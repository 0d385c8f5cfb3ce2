use crate::assembler::SnapshotAssembler;
use crate::client::ClientKind;
use crate::error::Result;
use crate::fetcher::{Fetcher, FetcherOptions};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::model::ClientData;
use crate::notify::Notifier;
use crate::source::Source;
use crate::store::Store;
use crate::trend::{self, Shares};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    Acquiring,
    Reporting,
    Finished,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub client: ClientKind,
    pub skip_update: bool,
    pub concurrent_views: bool,
    pub history_limit: usize,
    pub chart_url: String,
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub measurement: Option<ClientData>,
    pub history_len: usize,
    pub report_text: String,
    pub chart_url: String,
}

/// One batch invocation: measure, persist, report.
pub struct Reporter {
    source: Source,
    fetcher: Fetcher,
    store: Box<dyn Store>,
    notifier: Box<dyn Notifier>,
    settings: RunSettings,
    metrics: Arc<MetricsCollector>,
    state_watcher: watch::Sender<ReporterState>,
}

impl Reporter {
    pub fn new(
        source: Source,
        options: FetcherOptions,
        store: Box<dyn Store>,
        notifier: Box<dyn Notifier>,
        settings: RunSettings,
    ) -> Result<Self> {
        let metrics = Arc::new(MetricsCollector::new());
        let fetcher = Fetcher::new(&source, options, metrics.clone())?;
        let (state_tx, _) = watch::channel(ReporterState::Idle);

        Ok(Self {
            source,
            fetcher,
            store,
            notifier,
            settings,
            metrics,
            state_watcher: state_tx,
        })
    }

    pub fn watch_state(&self) -> watch::Receiver<ReporterState> {
        self.state_watcher.subscribe()
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        let result = self.run_inner(cancel).await;
        let closed = self.store.close().await;
        let state = if result.is_ok() {
            ReporterState::Finished
        } else {
            ReporterState::Failed
        };
        self.set_state(state);
        let summary = result?;
        closed?;
        Ok(summary)
    }

    async fn run_inner(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        let client = self.settings.client;
        let mut measurement = None;

        if !self.settings.skip_update {
            self.set_state(ReporterState::Acquiring);
            log::info!("Scanning {} client nodes on {}", client, self.source.name());

            let assembler = SnapshotAssembler::new(&self.source, &self.fetcher, self.settings.concurrent_views);
            let data = assembler.acquire(client, cancel).await?;
            log_measurement(&data);

            self.store.append(&data).await?;
            log::info!("Client data added successfully");
            measurement = Some(data);
        }

        self.set_state(ReporterState::Reporting);
        log::info!("Getting historical data for reporting");
        let history = self
            .store
            .query_latest(self.source.kind.tag(), client, self.settings.history_limit)
            .await?;
        log::info!("Retrieved historical data, count={}", history.len());

        let report = trend::compose(self.source.name(), &history)?;
        let chart_url = report.chart.image_url(&self.settings.chart_url)?.to_string();

        log::info!("Sending report");
        self.notifier
            .post_report(self.source.name(), &report.text, &chart_url)
            .await?;
        log::info!("Report sent successfully");

        Ok(RunSummary {
            measurement,
            history_len: history.len(),
            report_text: report.text,
            chart_url,
        })
    }

    fn set_state(&self, state: ReporterState) {
        log::debug!("Reporter state: {:?}", state);
        let _ = self.state_watcher.send(state);
    }
}

fn log_measurement(data: &ClientData) {
    match Shares::of(data) {
        Ok(shares) => log::info!(
            "Resulting client data: total={} clientTotal={} percentageOfNodes={:.2}% totalSynced={} clientSynced={} percentageOfSynced={:.2}% syncedPercentage={:.2}%",
            data.total(),
            data.client_total(),
            shares.of_network,
            data.total_synced(),
            data.client_synced(),
            shares.of_synced,
            shares.synced_ratio,
        ),
        Err(e) => log::warn!(
            "Resulting client data: total={} clientTotal={} totalSynced={} clientSynced={} ({})",
            data.total(),
            data.client_total(),
            data.total_synced(),
            data.client_synced(),
            e
        ),
    }
}
