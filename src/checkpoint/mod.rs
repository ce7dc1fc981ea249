//! # Checkpoint Store
//!
//! Durable record of the highest query id known to be delivered. The
//! pipeline resumes from here after a restart.
//!
//! - [`FileCheckpointStore`] - single decimal value in a text file, replaced atomically
//! - [`MemoryCheckpointStore`] - in-process store for tests and dry runs

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::error::PipelineResult;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;

/// Value reported when nothing has been delivered yet
pub const INITIAL_CHECKPOINT: i64 = 0;

#[async_trait]
pub trait CheckpointStore: Send + Sync + std::fmt::Debug {
    /// Last durably recorded id, or [`INITIAL_CHECKPOINT`] if none exists.
    ///
    /// Missing or corrupt state reads as the initial checkpoint with a warning.
    async fn read(&self) -> PipelineResult<i64>;

    /// Durably replace the stored id. A crash mid-write leaves either the old
    /// or the new value.
    async fn write(&self, id: i64) -> PipelineResult<()>;
}
