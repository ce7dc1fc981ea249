use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use super::{RecordSource, RecordStream};
use crate::error::PipelineError;
use crate::models::RawRecord;

/// Records held in memory, served in id order.
#[derive(Debug, Default)]
pub struct MemorySource {
    inner: Mutex<MemorySourceState>,
}

#[derive(Debug, Default)]
struct MemorySourceState {
    records: Vec<RawRecord>,
    unavailable: Option<String>,
    fetches: usize,
}

impl MemorySource {
    pub fn new(records: impl IntoIterator<Item = RawRecord>) -> Self {
        let source = Self::default();
        source.append(records);
        source
    }

    /// Append rows as the external writer would
    pub fn append(&self, records: impl IntoIterator<Item = RawRecord>) {
        let mut state = self.inner.lock();
        state.records.extend(records);
        state.records.sort_by_key(|record| record.id);
    }

    /// Make subsequent fetches fail as if the store could not be opened
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.inner.lock().unavailable = reason.map(str::to_string);
    }

    /// Number of times `fetch_since` has been called
    pub fn fetch_count(&self) -> usize {
        self.inner.lock().fetches
    }
}

impl RecordSource for MemorySource {
    fn fetch_since(&self, last_id: i64) -> RecordStream<'_> {
        let mut state = self.inner.lock();
        state.fetches += 1;

        if let Some(reason) = &state.unavailable {
            let err = PipelineError::source_unavailable(reason.clone());
            return stream::once(async move { Err(err) }).boxed();
        }

        let pending: Vec<RawRecord> = state
            .records
            .iter()
            .filter(|record| record.id > last_id)
            .cloned()
            .collect();

        stream::iter(pending.into_iter().map(Ok)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn record(id: i64) -> RawRecord {
        RawRecord::new(id, "example.com", "10.0.0.2", "2024-03-15 10:30:00", 1_710_498_600)
    }

    #[tokio::test]
    async fn test_fetch_filters_and_orders() {
        let source = MemorySource::new([record(3), record(1), record(2)]);

        let ids: Vec<i64> = source
            .fetch_since(1)
            .map_ok(|r| r.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_yields_error() {
        let source = MemorySource::new([record(1)]);
        source.set_unavailable(Some("database is locked"));

        let result: Result<Vec<RawRecord>, _> = source.fetch_since(0).try_collect().await;
        assert_eq!(
            result.unwrap_err(),
            PipelineError::source_unavailable("database is locked")
        );
    }
}
