use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CheckpointStore, INITIAL_CHECKPOINT};
use crate::error::{PipelineError, PipelineResult};

/// In-process checkpoint.
///
/// Keeps the history of successful writes and can be switched into a failing
/// mode to reproduce a crash between delivery and checkpoint.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    value: Option<i64>,
    writes: Vec<i64>,
    fail_writes: bool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(id: i64) -> Self {
        let store = Self::default();
        store.inner.lock().value = Some(id);
        store
    }

    /// Current value without going through the trait
    pub fn current(&self) -> i64 {
        self.inner.lock().value.unwrap_or(INITIAL_CHECKPOINT)
    }

    /// Every id successfully written, in order
    pub fn writes(&self) -> Vec<i64> {
        self.inner.lock().writes.clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn read(&self) -> PipelineResult<i64> {
        Ok(self.current())
    }

    async fn write(&self, id: i64) -> PipelineResult<()> {
        let mut state = self.inner.lock();
        if state.fail_writes {
            return Err(PipelineError::checkpoint_io("simulated write failure"));
        }
        state.value = Some(id);
        state.writes.push(id);
        Ok(())
    }
}
