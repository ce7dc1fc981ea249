//! Shared fixtures for integration tests

#![allow(dead_code)]

pub mod fake_elasticsearch;
pub mod strategies;

use pihole_shipper::RawRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;

/// A well-formed record with a fixed domain and client
pub fn record(id: i64, local_time: &str) -> RawRecord {
    RawRecord::new(id, format!("host{id}.example.com"), "192.168.1.20", local_time, 1_710_498_600 + id)
}

/// Records `1..=n`, all in March 2024
pub fn march_records(n: i64) -> Vec<RawRecord> {
    (1..=n).map(|id| record(id, "2024-03-15 10:30:00")).collect()
}

/// Row layout of the FTL `queries` table, reduced to what the shipper reads
#[derive(Debug, Clone)]
pub struct QueryRow {
    pub id: i64,
    pub timestamp: i64,
    pub domain: String,
    pub client: String,
}

impl QueryRow {
    pub fn new(id: i64, timestamp: i64, domain: &str, client: &str) -> Self {
        Self {
            id,
            timestamp,
            domain: domain.to_string(),
            client: client.to_string(),
        }
    }
}

/// Create a `queries` table at `path` holding `rows`
pub async fn seed_sqlite(path: &Path, rows: &[QueryRow]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("open seed database");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS queries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            type INTEGER NOT NULL DEFAULT 1,
            status INTEGER NOT NULL DEFAULT 2,
            domain TEXT NOT NULL,
            client TEXT NOT NULL,
            forward TEXT
        )",
    )
    .execute(&pool)
    .await
    .expect("create queries table");

    for row in rows {
        sqlx::query("INSERT INTO queries (id, timestamp, domain, client) VALUES (?, ?, ?, ?)")
            .bind(row.id)
            .bind(row.timestamp)
            .bind(&row.domain)
            .bind(&row.client)
            .execute(&pool)
            .await
            .expect("insert query row");
    }

    pool.close().await;
}
