use chrono::{Duration, TimeZone, Utc};
use node_census::model::NodeCounts;
use node_census::store::{CsvStore, JsonLinesStore, SqliteStore, Store};
use node_census::{ClientData, ClientKind};
use tempfile::TempDir;

fn measurement(source: &str, client: ClientKind, day: i64, client_total: u64) -> ClientData {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    ClientData::new(
        source,
        client,
        NodeCounts {
            total: 1000,
            client_total,
            total_synced: 600,
            client_synced: client_total / 2,
        },
        start + Duration::days(day),
    )
    .unwrap()
}

async fn exercise(store: &mut dyn Store) {
    // Appended out of order on purpose; queries sort by creation time.
    for (day, total) in [(1, 110), (0, 100), (3, 130), (2, 120)] {
        store
            .append(&measurement("ethernets", ClientKind::Nethermind, day, total))
            .await
            .unwrap();
    }
    store
        .append(&measurement("ethernodes", ClientKind::Nethermind, 5, 999))
        .await
        .unwrap();
    store
        .append(&measurement("ethernets", ClientKind::Geth, 5, 700))
        .await
        .unwrap();

    let latest = store
        .query_latest("ethernets", ClientKind::Nethermind, 3)
        .await
        .unwrap();
    let totals: Vec<u64> = latest.iter().map(ClientData::client_total).collect();
    assert_eq!(totals, vec![130, 120, 110]);
    assert_eq!(latest[0], measurement("ethernets", ClientKind::Nethermind, 3, 130));

    let other = store.query_latest("ethernodes", ClientKind::Geth, 10).await.unwrap();
    assert!(other.is_empty());

    store.close().await.unwrap();
}

#[tokio::test]
async fn sqlite_store_round_trips_history() {
    let dir = TempDir::new().unwrap();
    let mut store = SqliteStore::new(dir.path().join("census.db"), "client_data".to_string())
        .await
        .unwrap();
    exercise(&mut store).await;
}

#[tokio::test]
async fn sqlite_store_rejects_bad_table_name() {
    let dir = TempDir::new().unwrap();
    let result = SqliteStore::new(dir.path().join("census.db"), "data; DROP TABLE x".to_string()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn json_lines_store_round_trips_history() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonLinesStore::new(dir.path().join("census.jsonl")).unwrap();
    exercise(&mut store).await;
}

#[tokio::test]
async fn csv_store_round_trips_history() {
    let dir = TempDir::new().unwrap();
    let mut store = CsvStore::new(dir.path().join("census.csv")).unwrap();
    exercise(&mut store).await;
}

#[tokio::test]
async fn csv_store_reopens_without_repeating_headers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("census.csv");

    let mut first = CsvStore::new(path.clone()).unwrap();
    first
        .append(&measurement("ethernets", ClientKind::Besu, 0, 50))
        .await
        .unwrap();
    first.close().await.unwrap();

    let mut second = CsvStore::new(path.clone()).unwrap();
    second
        .append(&measurement("ethernets", ClientKind::Besu, 1, 60))
        .await
        .unwrap();
    let latest = second.query_latest("ethernets", ClientKind::Besu, 10).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].client_total(), 60);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("client_total").count(), 1);
}
