use serde::{Deserialize, Serialize};

/// Document body indexed into Elasticsearch.
///
/// Field names are part of the index mapping and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub id: i64,
    pub domain: String,
    pub client: String,
    /// ISO-8601 local date and time, `YYYY-MM-DDTHH:MM:SS`
    pub datetime: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}
