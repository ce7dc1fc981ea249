use serde::{Deserialize, Serialize};

/// One DNS query as read from the log store.
///
/// `local_time` is the store's own rendering of `timestamp` in the host's
/// local time zone (`YYYY-MM-DD HH:MM:SS`). Ids are unique and strictly
/// increasing in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RawRecord {
    pub id: i64,
    pub domain: String,
    pub client: String,
    pub local_time: String,
    pub timestamp: i64,
}

impl RawRecord {
    pub fn new(
        id: i64,
        domain: impl Into<String>,
        client: impl Into<String>,
        local_time: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            domain: domain.into(),
            client: client.into(),
            local_time: local_time.into(),
            timestamp,
        }
    }
}
