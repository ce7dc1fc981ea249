//! # Source Reader
//!
//! Read side of the pipeline: every record whose id is strictly greater than
//! the checkpoint, in ascending id order.
//!
//! Ordering is load-bearing. The driver checkpoints each record as it goes, so
//! a source that yielded a later id before an earlier one would leave a gap
//! that is never retried.
//!
//! - [`SqliteLogSource`] - the Pi-hole FTL database
//! - [`MemorySource`] - in-process records for tests

pub mod memory;
pub mod sqlite;

use futures::stream::BoxStream;

use crate::error::PipelineResult;
use crate::models::RawRecord;

pub use memory::MemorySource;
pub use sqlite::SqliteLogSource;

/// Lazily produced records; failures surface as `Err` items
pub type RecordStream<'a> = BoxStream<'a, PipelineResult<RawRecord>>;

pub trait RecordSource: Send + Sync + std::fmt::Debug {
    /// Records with `id > last_id`, ascending by id.
    ///
    /// Each call queries from scratch and has no side effects, so repeated
    /// calls with the same `last_id` are idempotent.
    fn fetch_since(&self, last_id: i64) -> RecordStream<'_>;
}
