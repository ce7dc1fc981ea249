//! # Pipeline Errors
//!
//! Error taxonomy for a single shipping pass. Every variant aborts the pass it
//! occurs in; none of them terminate the process.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The log store could not be opened or queried
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A record's local-time string did not match `YYYY-MM-DD HH:MM:SS`
    #[error("Malformed timestamp for record {id}: {value:?}")]
    MalformedTimestamp { id: i64, value: String },

    /// Transport, TLS or authentication failure talking to the destination
    #[error("Delivery unavailable: {0}")]
    DeliveryUnavailable(String),

    /// The destination refused the document
    #[error("Delivery rejected by index {index}: {status} - {reason}")]
    DeliveryRejected {
        index: String,
        status: u16,
        reason: String,
    },

    /// The checkpoint could not be read or persisted
    #[error("Checkpoint I/O error: {0}")]
    CheckpointIo(String),

    /// A skipped record could not be written to the dead-letter journal
    #[error("Dead-letter journal error: {0}")]
    DeadLetterIo(String),
}

impl PipelineError {
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable(reason.into())
    }

    pub fn delivery_unavailable(reason: impl Into<String>) -> Self {
        Self::DeliveryUnavailable(reason.into())
    }

    pub fn delivery_rejected(index: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::DeliveryRejected {
            index: index.into(),
            status,
            reason: reason.into(),
        }
    }

    pub fn checkpoint_io(reason: impl Into<String>) -> Self {
        Self::CheckpointIo(reason.into())
    }

    /// Whether the next scheduled pass is likely to succeed without operator action
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable(_) | PipelineError::DeliveryUnavailable(_)
        )
    }

    /// Short machine-friendly name used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable(_) => "source_unavailable",
            PipelineError::MalformedTimestamp { .. } => "malformed_timestamp",
            PipelineError::DeliveryUnavailable(_) => "delivery_unavailable",
            PipelineError::DeliveryRejected { .. } => "delivery_rejected",
            PipelineError::CheckpointIo(_) => "checkpoint_io",
            PipelineError::DeadLetterIo(_) => "dead_letter_io",
        }
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::SourceUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::DeliveryUnavailable(err.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
