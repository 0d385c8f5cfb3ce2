use chrono::{Duration as Days, Utc};
use node_census::challenge::ChallengeDetector;
use node_census::model::NodeCounts;
use node_census::notify::ConsoleNotifier;
use node_census::retry::RetryPolicy;
use node_census::store::{JsonLinesStore, Store};
use node_census::{
    ClientData, ClientKind, Error, FetcherOptions, Reporter, ReporterState, RunSettings, Source, SourceKind,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ethernets_page(total: u64, nethermind: u64) -> String {
    format!(
        "<html><body><div><h2>Client Names</h2><span>Total ({})</span><span>Nethermind ({})</span></div></body></html>",
        total, nethermind
    )
}

fn options() -> FetcherOptions {
    FetcherOptions {
        retry: RetryPolicy::new(0, Duration::from_millis(10)),
        attempt_delay: Duration::ZERO,
        request_timeout: Duration::from_secs(5),
        detector: ChallengeDetector::default(),
    }
}

fn settings(skip_update: bool) -> RunSettings {
    RunSettings {
        client: ClientKind::Nethermind,
        skip_update,
        concurrent_views: false,
        history_limit: 35,
        chart_url: "https://quickchart.io/chart".to_string(),
    }
}

async fn seed(path: &Path) {
    let mut store = JsonLinesStore::new(path.to_path_buf()).unwrap();
    let yesterday = ClientData::new(
        "ethernets",
        ClientKind::Nethermind,
        NodeCounts {
            total: 880,
            client_total: 200,
            total_synced: 490,
            client_synced: 130,
        },
        Utc::now() - Days::days(1),
    )
    .unwrap();
    store.append(&yesterday).await.unwrap();
}

#[tokio::test]
async fn full_run_measures_stores_and_reports() {
    let server = MockServer::start().await;
    for (synced, body) in [("yes", ethernets_page(500, 120)), ("no", ethernets_page(400, 90))] {
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("synced", synced))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let history_path = dir.path().join("history.jsonl");
    seed(&history_path).await;

    let source = Source::new(SourceKind::Ethernets, &[server.uri()]).unwrap();
    let store = JsonLinesStore::new(history_path.clone()).unwrap();
    let mut reporter = Reporter::new(
        source,
        options(),
        Box::new(store),
        Box::new(ConsoleNotifier::default()),
        settings(false),
    )
    .unwrap();
    let state = reporter.watch_state();

    let summary = reporter.run(&CancellationToken::new()).await.unwrap();

    let measurement = summary.measurement.unwrap();
    assert_eq!(measurement.client_total(), 210);
    assert_eq!(measurement.total_synced(), 500);
    assert_eq!(summary.history_len, 2);
    assert!(summary.report_text.starts_with("Today there are *210* | *23.33%* Nethermind nodes"));
    assert!(summary.report_text.contains(
        "The number of all nodes is *growing* ( *+10* :muscle:) and synced nodes are *shrinking* ( *-10* :fire_extinguisher:)"
    ));
    assert!(summary.chart_url.starts_with("https://quickchart.io/chart?c="));
    assert_eq!(*state.borrow(), ReporterState::Finished);

    let mut reopened = JsonLinesStore::new(history_path).unwrap();
    let stored = reopened
        .query_latest("ethernets", ClientKind::Nethermind, 10)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], measurement);

    let metrics = reporter.get_metrics();
    assert_eq!(metrics.attempts_total, 2);
    assert_eq!(metrics.attempts_success, 2);
}

#[tokio::test]
async fn skip_update_reports_from_history_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let history_path = dir.path().join("history.jsonl");
    seed(&history_path).await;

    let source = Source::new(SourceKind::Ethernets, &[server.uri()]).unwrap();
    let mut reporter = Reporter::new(
        source,
        options(),
        Box::new(JsonLinesStore::new(history_path).unwrap()),
        Box::new(ConsoleNotifier::default()),
        settings(true),
    )
    .unwrap();

    let summary = reporter.run(&CancellationToken::new()).await.unwrap();
    assert!(summary.measurement.is_none());
    assert_eq!(summary.history_len, 1);
    assert!(!summary.report_text.contains('\n'));
}

#[tokio::test]
async fn failed_acquisition_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><title>Just a moment...</title></html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let history_path = dir.path().join("history.jsonl");

    let source = Source::new(SourceKind::Ethernets, &[server.uri()]).unwrap();
    let mut reporter = Reporter::new(
        source,
        options(),
        Box::new(JsonLinesStore::new(history_path.clone()).unwrap()),
        Box::new(ConsoleNotifier::default()),
        settings(false),
    )
    .unwrap();
    let state = reporter.watch_state();

    let err = reporter.run(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Exhausted { endpoints: 1 }));
    assert_eq!(*state.borrow(), ReporterState::Failed);
    assert!(!history_path.exists());
}

#[tokio::test]
async fn empty_history_cannot_be_reported() {
    let dir = TempDir::new().unwrap();
    let source = Source::new(SourceKind::Ethernodes, &[]).unwrap();
    let mut reporter = Reporter::new(
        source,
        options(),
        Box::new(JsonLinesStore::new(dir.path().join("history.jsonl")).unwrap()),
        Box::new(ConsoleNotifier::default()),
        settings(true),
    )
    .unwrap();

    let err = reporter.run(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::EmptyHistory));
}
