//! # Record Transformer
//!
//! Pure mapping from [`RawRecord`] to [`NormalizedDocument`] and from a
//! document to the monthly index it belongs in. No I/O happens here.

use chrono::NaiveDateTime;

use crate::constants::{defaults, formats};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{NormalizedDocument, RawRecord};

/// Convert a raw query row into the indexed document.
///
/// The store already rendered the epoch timestamp in local time; this only
/// re-expresses it in ISO-8601. Fails with [`PipelineError::MalformedTimestamp`]
/// when the rendering does not match `YYYY-MM-DD HH:MM:SS`.
pub fn transform(record: &RawRecord) -> PipelineResult<NormalizedDocument> {
    let parsed = NaiveDateTime::parse_from_str(&record.local_time, formats::SOURCE_LOCAL_TIME)
        .map_err(|_| PipelineError::MalformedTimestamp {
            id: record.id,
            value: record.local_time.clone(),
        })?;

    Ok(NormalizedDocument {
        id: record.id,
        domain: record.domain.clone(),
        client: record.client.clone(),
        datetime: parsed.format(formats::ISO_DATETIME).to_string(),
        timestamp: record.timestamp,
    })
}

/// Routes documents to `<prefix>-YYYY-MM` indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTransformer {
    index_prefix: String,
}

impl Default for RecordTransformer {
    fn default() -> Self {
        Self::new(defaults::INDEX_PREFIX)
    }
}

impl RecordTransformer {
    pub fn new(index_prefix: impl Into<String>) -> Self {
        Self {
            index_prefix: index_prefix.into(),
        }
    }

    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }

    /// See [`transform`]
    pub fn transform(&self, record: &RawRecord) -> PipelineResult<NormalizedDocument> {
        transform(record)
    }

    /// Partition key from the year and month of the document's datetime
    pub fn partition_key(&self, doc: &NormalizedDocument) -> String {
        let date = doc.datetime.split('T').next().unwrap_or_default();
        let year_month: Vec<&str> = date.splitn(3, '-').take(2).collect();
        format!("{}-{}", self.index_prefix, year_month.join("-"))
    }
}
