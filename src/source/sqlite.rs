//! SQLite-backed source over the Pi-hole FTL `queries` table.

use futures::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{RecordSource, RecordStream};
use crate::error::{PipelineError, PipelineResult};
use crate::models::RawRecord;

/// `local_time` is rendered by SQLite itself so it follows the host's zone
/// configuration exactly as Pi-hole's own tooling does.
const FETCH_SINCE_SQL: &str = "\
    SELECT id, domain, client, \
           datetime(timestamp, 'unixepoch', 'localtime') AS local_time, \
           CAST(timestamp AS INTEGER) AS timestamp \
    FROM queries \
    WHERE id > ? \
    ORDER BY id ASC";

/// Read-only handle on the FTL database.
///
/// The pool connects lazily, so a missing or locked database shows up as
/// [`PipelineError::SourceUnavailable`] on the pass that needed it rather than
/// at startup. Idle connections are released between passes.
#[derive(Debug, Clone)]
pub struct SqliteLogSource {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteLogSource {
    pub fn open_lazy(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(60))
            .connect_lazy_with(options);

        Self { pool, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Confirm the database can be opened and queried
    pub async fn health_check(&self) -> PipelineResult<bool> {
        let row = sqlx::query("SELECT 1 AS health")
            .fetch_one(&self.pool)
            .await?;

        let health: i32 = row.try_get("health")?;
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

impl RecordSource for SqliteLogSource {
    fn fetch_since(&self, last_id: i64) -> RecordStream<'_> {
        let path = self.path.clone();
        sqlx::query_as::<_, RawRecord>(FETCH_SINCE_SQL)
            .bind(last_id)
            .fetch(&self.pool)
            .map_err(move |e| {
                PipelineError::source_unavailable(format!("querying {}: {e}", path.display()))
            })
            .boxed()
    }
}
