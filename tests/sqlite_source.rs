//! SqliteLogSource against a real database file

mod common;

use common::{seed_sqlite, QueryRow};
use futures::TryStreamExt;
use pihole_shipper::{transform, PipelineError, RawRecord, RecordSource, SqliteLogSource};

async fn fetch_all(source: &SqliteLogSource, last_id: i64) -> Result<Vec<RawRecord>, PipelineError> {
    source.fetch_since(last_id).try_collect().await
}

fn rows() -> Vec<QueryRow> {
    vec![
        QueryRow::new(1, 1_710_498_600, "example.com", "192.168.1.20"),
        QueryRow::new(2, 1_710_498_660, "ads.example.net", "192.168.1.21"),
        QueryRow::new(5, 1_710_498_720, "updates.example.org", "192.168.1.20"),
        QueryRow::new(9, 1_712_000_000, "example.com", "fe80::1"),
    ]
}

#[tokio::test]
async fn test_fetch_since_filters_by_id_in_ascending_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pihole-FTL.db");
    seed_sqlite(&db, &rows()).await;
    let source = SqliteLogSource::open_lazy(&db);

    let records = fetch_all(&source, 2).await.unwrap();

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![5, 9]);
    assert_eq!(records[0].domain, "updates.example.org");
    assert_eq!(records[0].client, "192.168.1.20");
    assert_eq!(records[0].timestamp, 1_710_498_720);
    assert_eq!(records[1].client, "fe80::1");

    source.close().await;
}

#[tokio::test]
async fn test_fetch_since_zero_returns_everything() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pihole-FTL.db");
    seed_sqlite(&db, &rows()).await;
    let source = SqliteLogSource::open_lazy(&db);

    let records = fetch_all(&source, 0).await.unwrap();
    assert_eq!(records.len(), 4);

    let beyond = fetch_all(&source, 9).await.unwrap();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn test_local_time_is_rendered_for_the_transformer() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pihole-FTL.db");
    seed_sqlite(&db, &rows()).await;
    let source = SqliteLogSource::open_lazy(&db);

    for record in fetch_all(&source, 0).await.unwrap() {
        assert_eq!(record.local_time.len(), 19, "{:?}", record.local_time);
        let doc = transform(&record).unwrap();
        assert_eq!(doc.datetime, record.local_time.replace(' ', "T"));
        assert_eq!(doc.timestamp, record.timestamp);
    }
}

#[tokio::test]
async fn test_source_sees_rows_appended_between_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pihole-FTL.db");
    seed_sqlite(&db, &rows()[..2]).await;
    let source = SqliteLogSource::open_lazy(&db);

    assert_eq!(fetch_all(&source, 0).await.unwrap().len(), 2);

    seed_sqlite(&db, &rows()[2..]).await;
    let ids: Vec<i64> = fetch_all(&source, 2)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![5, 9]);
}

#[tokio::test]
async fn test_missing_database_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let source = SqliteLogSource::open_lazy(dir.path().join("absent.db"));

    let err = fetch_all(&source, 0).await.unwrap_err();
    assert!(matches!(err, PipelineError::SourceUnavailable(_)), "{err:?}");
    assert!(err.is_transient());
    assert!(source.health_check().await.is_err());
}

#[tokio::test]
async fn test_health_check_on_seeded_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("pihole-FTL.db");
    seed_sqlite(&db, &[]).await;
    let source = SqliteLogSource::open_lazy(&db);

    assert!(source.health_check().await.unwrap());
}
