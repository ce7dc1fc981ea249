//! # Dead-Letter Journal
//!
//! Records the pipeline skips instead of blocking on. Each line is a JSON
//! object holding the raw record, the error and the time it was skipped, so
//! an operator can inspect or replay them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{PipelineError, PipelineResult};
use crate::models::RawRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub record: RawRecord,
    pub error_kind: String,
    pub error: String,
    /// RFC 3339, UTC
    pub skipped_at: String,
}

#[derive(Debug, Clone)]
pub struct DeadLetterJournal {
    path: PathBuf,
}

impl DeadLetterJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` and sync before returning; the caller only advances
    /// the checkpoint past a skipped record once this succeeds.
    pub async fn record(&self, record: &RawRecord, error: &PipelineError) -> PipelineResult<()> {
        let entry = DeadLetterEntry {
            record: record.clone(),
            error_kind: error.kind().to_string(),
            error: error.to_string(),
            skipped_at: Utc::now().to_rfc3339(),
        };
        let mut line = serde_json::to_string(&entry).map_err(|e| self.io_error(e))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_data().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Read back every entry; used by tests and operators
    pub async fn entries(&self) -> PipelineResult<Vec<DeadLetterEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| self.io_error(e)))
            .collect()
    }

    fn io_error(&self, err: impl std::fmt::Display) -> PipelineError {
        PipelineError::DeadLetterIo(format!("{}: {err}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_entries_append_in_order() {
        let dir = TempDir::new().unwrap();
        let journal = DeadLetterJournal::new(dir.path().join("dead").join("skipped.jsonl"));

        for id in [4, 9] {
            let record = RawRecord::new(id, "bad.example", "10.0.0.9", "yesterday", 0);
            let err = PipelineError::MalformedTimestamp {
                id,
                value: "yesterday".to_string(),
            };
            journal.record(&record, &err).await.unwrap();
        }

        let entries = journal.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record.id, 4);
        assert_eq!(entries[1].record.id, 9);
        assert_eq!(entries[1].error_kind, "malformed_timestamp");
    }

    #[tokio::test]
    async fn test_missing_journal_has_no_entries() {
        let dir = TempDir::new().unwrap();
        let journal = DeadLetterJournal::new(dir.path().join("none.jsonl"));
        assert!(journal.entries().await.unwrap().is_empty());
    }
}
