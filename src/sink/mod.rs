//! # Delivery Sink
//!
//! Write side of the pipeline: one document to one partition per call.
//!
//! Delivery is an unconditional append. Sending the same document twice (for
//! example after a crash between delivery and checkpoint) produces a duplicate
//! rather than an overwrite, which is the accepted at-least-once behavior.
//! Sinks never retry internally; the next scheduled pass is the retry.
//!
//! - [`ElasticsearchSink`] - Elasticsearch index API over HTTP(S)
//! - [`MemorySink`] - in-process recorder for tests

pub mod elasticsearch;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::models::NormalizedDocument;

pub use elasticsearch::{ElasticsearchSink, ElasticsearchSinkConfig};
pub use memory::{FailureMode, MemorySink};

/// Destination acknowledgement for a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAck {
    /// Partition the document landed in
    #[serde(rename = "_index")]
    pub index: String,
    /// Identifier assigned by the destination
    #[serde(rename = "_id")]
    pub doc_id: String,
    /// Destination's verdict, e.g. `created`
    pub result: String,
}

#[async_trait]
pub trait DeliverySink: Send + Sync + std::fmt::Debug {
    /// Send `doc` to the partition named `partition_key`, creating it if needed.
    ///
    /// Fails with [`DeliveryUnavailable`](crate::PipelineError::DeliveryUnavailable)
    /// on transport or auth problems and
    /// [`DeliveryRejected`](crate::PipelineError::DeliveryRejected) when the
    /// destination refuses the document.
    async fn deliver(
        &self,
        partition_key: &str,
        doc: &NormalizedDocument,
    ) -> PipelineResult<DeliveryAck>;
}
