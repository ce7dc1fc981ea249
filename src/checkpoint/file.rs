use async_trait::async_trait;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{CheckpointStore, INITIAL_CHECKPOINT};
use crate::error::{PipelineError, PipelineResult};

/// Checkpoint kept as a decimal id in a text file.
///
/// Writes go to a temporary file in the same directory which is synced and
/// then renamed over the target, so readers only ever see a complete value.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(contents: &str) -> Option<i64> {
        contents
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= INITIAL_CHECKPOINT)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn read(&self) -> PipelineResult<i64> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => match Self::parse(&contents) {
                Some(id) => {
                    debug!(checkpoint = id, path = %self.path.display(), "Checkpoint read");
                    Ok(id)
                }
                None => {
                    warn!(
                        path = %self.path.display(),
                        contents = %contents.trim(),
                        "Checkpoint file is corrupt, starting from zero"
                    );
                    Ok(INITIAL_CHECKPOINT)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    path = %self.path.display(),
                    "No checkpoint file found, starting from zero"
                );
                Ok(INITIAL_CHECKPOINT)
            }
            Err(e) => Err(PipelineError::checkpoint_io(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, id: i64) -> PipelineResult<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, id))
            .await
            .map_err(|e| PipelineError::checkpoint_io(format!("checkpoint writer panicked: {e}")))?
            .map_err(|e| {
                PipelineError::checkpoint_io(format!("writing {}: {e}", self.path.display()))
            })
    }
}

fn write_atomically(path: &Path, id: i64) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    write!(tmp, "{id}")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // The rename itself must reach disk for the new value to survive power loss.
    #[cfg(unix)]
    fs::File::open(&dir)?.sync_all()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_zero() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("last_processed_id.txt"));
        assert_eq!(store.read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("state").join("last_processed_id.txt"));

        store.write(41).await.unwrap();
        store.write(42).await.unwrap();
        assert_eq!(store.read().await.unwrap(), 42);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "42");
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("last_processed_id.txt"));

        for id in 1..=5 {
            store.write(id).await.unwrap();
        }

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_processed_id.txt");

        for contents in ["", "not-a-number", "-5", "12abc"] {
            fs::write(&path, contents).unwrap();
            let store = FileCheckpointStore::new(&path);
            assert_eq!(store.read().await.unwrap(), 0, "contents {contents:?}");
        }
    }

    #[tokio::test]
    async fn test_reads_value_with_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_processed_id.txt");
        fs::write(&path, "1234\n").unwrap();

        let store = FileCheckpointStore::new(&path);
        assert_eq!(store.read().await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as a checkpoint.
        let store = FileCheckpointStore::new(dir.path());
        assert!(matches!(
            store.read().await,
            Err(PipelineError::CheckpointIo(_))
        ));
    }
}
