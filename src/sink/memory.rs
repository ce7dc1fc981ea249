use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{DeliveryAck, DeliverySink};
use crate::error::{PipelineError, PipelineResult};
use crate::models::NormalizedDocument;

/// How a scripted delivery failure presents itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Unavailable,
    Rejected,
}

/// Records every delivered document in order.
///
/// Failures can be scripted per record id to exercise the driver's
/// containment behavior.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<MemorySinkState>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    delivered: Vec<(String, NormalizedDocument)>,
    attempts: Vec<i64>,
    failures: HashMap<i64, FailureMode>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every delivery of record `id` until cleared
    pub fn fail_on(&self, id: i64, mode: FailureMode) {
        self.inner.lock().failures.insert(id, mode);
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    /// Successfully delivered `(partition_key, document)` pairs
    pub fn delivered(&self) -> Vec<(String, NormalizedDocument)> {
        self.inner.lock().delivered.clone()
    }

    pub fn delivered_ids(&self) -> Vec<i64> {
        self.inner.lock().delivered.iter().map(|(_, doc)| doc.id).collect()
    }

    /// Every id `deliver` was called with, including failures
    pub fn attempted_ids(&self) -> Vec<i64> {
        self.inner.lock().attempts.clone()
    }
}

#[async_trait]
impl DeliverySink for MemorySink {
    async fn deliver(
        &self,
        partition_key: &str,
        doc: &NormalizedDocument,
    ) -> PipelineResult<DeliveryAck> {
        let mut state = self.inner.lock();
        state.attempts.push(doc.id);

        match state.failures.get(&doc.id) {
            Some(FailureMode::Unavailable) => {
                return Err(PipelineError::delivery_unavailable(format!(
                    "simulated outage delivering record {}",
                    doc.id
                )));
            }
            Some(FailureMode::Rejected) => {
                return Err(PipelineError::delivery_rejected(
                    partition_key,
                    400,
                    format!("simulated rejection of record {}", doc.id),
                ));
            }
            None => {}
        }

        state
            .delivered
            .push((partition_key.to_string(), doc.clone()));
        Ok(DeliveryAck {
            index: partition_key.to_string(),
            doc_id: format!("mem-{}", state.delivered.len()),
            result: "created".to_string(),
        })
    }
}
