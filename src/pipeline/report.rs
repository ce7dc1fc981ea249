use std::time::Duration;

use crate::error::PipelineError;
use crate::log_pass;

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for the next scheduled pass
    Idle,
    /// Executing a pass
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every pending record was handled
    Completed,
    /// The pass stopped early; the checkpoint reflects what was delivered before the error
    Aborted(PipelineError),
}

/// Summary of one read → transform → deliver → checkpoint pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Checkpoint read at the start of the pass, if it could be read
    pub starting_checkpoint: Option<i64>,
    /// Checkpoint durably stored when the pass ended
    pub final_checkpoint: Option<i64>,
    /// Records pulled from the source
    pub fetched: usize,
    /// Records acknowledged by the sink
    pub delivered: usize,
    /// Malformed records journaled and stepped over
    pub skipped: usize,
    pub outcome: PassOutcome,
    pub elapsed: Duration,
}

impl PassReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PassOutcome::Completed)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            PassOutcome::Completed => None,
            PassOutcome::Aborted(err) => Some(err),
        }
    }

    /// Whether the checkpoint moved during this pass
    pub fn advanced(&self) -> bool {
        match (self.starting_checkpoint, self.final_checkpoint) {
            (Some(start), Some(end)) => end > start,
            _ => false,
        }
    }

    pub(crate) fn log(&self) {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        match &self.outcome {
            PassOutcome::Completed => log_pass!(
                info,
                "New data successfully sent to Elasticsearch",
                rows: self.delivered,
                skipped: self.skipped,
                checkpoint: self.final_checkpoint,
                elapsed_ms: elapsed_ms,
            ),
            PassOutcome::Aborted(err) if err.is_transient() => log_pass!(
                warn,
                "Pass aborted, will retry next interval",
                error_kind: err.kind(),
                error: err.to_string(),
                rows: self.delivered,
                checkpoint: self.final_checkpoint,
            ),
            PassOutcome::Aborted(err) => log_pass!(
                error,
                "Pass aborted, will retry next interval",
                error_kind: err.kind(),
                error: err.to_string(),
                rows: self.delivered,
                checkpoint: self.final_checkpoint,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: PassOutcome) -> PassReport {
        PassReport {
            starting_checkpoint: Some(9),
            final_checkpoint: Some(10),
            fetched: 2,
            delivered: 1,
            skipped: 0,
            outcome,
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_log_covers_every_outcome() {
        for outcome in [
            PassOutcome::Completed,
            PassOutcome::Aborted(PipelineError::delivery_unavailable("connection refused")),
            PassOutcome::Aborted(PipelineError::delivery_rejected("pihole-dns-logs-2024-03", 400, "bad field")),
        ] {
            report(outcome).log();
        }
    }

    #[test]
    fn test_aborted_report_exposes_error() {
        let err = PipelineError::source_unavailable("database is locked");
        let aborted = report(PassOutcome::Aborted(err.clone()));
        assert!(!aborted.is_success());
        assert_eq!(aborted.error(), Some(&err));
        assert!(aborted.advanced());

        let unread = PassReport {
            starting_checkpoint: None,
            final_checkpoint: None,
            ..report(PassOutcome::Completed)
        };
        assert!(unread.is_success());
        assert!(!unread.advanced());
    }
}
