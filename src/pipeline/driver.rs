//! Pipeline driver: one pass, and the periodic loop around it.

use futures::TryStreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::report::{DriverState, PassOutcome, PassReport};
use crate::checkpoint::CheckpointStore;
use crate::config::{MalformedPolicy, ShipperConfig};
use crate::dead_letter::DeadLetterJournal;
use crate::error::{PipelineError, PipelineResult};
use crate::sink::DeliverySink;
use crate::source::RecordSource;
use crate::transform::RecordTransformer;
use crate::{log_pass, log_record};

/// Tunables for the driver, independent of how components are wired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub sleep_interval: Duration,
    /// Persist the checkpoint every N handled records; 1 means after each one
    pub checkpoint_every: u32,
    pub on_malformed: MalformedPolicy,
    pub index_prefix: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&ShipperConfig::default())
    }
}

impl From<&ShipperConfig> for PipelineSettings {
    fn from(config: &ShipperConfig) -> Self {
        Self {
            sleep_interval: config.sleep_interval(),
            checkpoint_every: config.checkpoint_every.max(1),
            on_malformed: config.on_malformed,
            index_prefix: config.index_prefix.clone(),
        }
    }
}

/// Progress within a single pass
#[derive(Debug, Default)]
struct PassProgress {
    starting: Option<i64>,
    /// Highest id durably checkpointed
    committed: Option<i64>,
    /// Highest id handled but not yet checkpointed
    pending: Option<i64>,
    pending_count: u32,
    last_seen: Option<i64>,
    fetched: usize,
    delivered: usize,
    skipped: usize,
}

impl PassProgress {
    fn handled(&mut self, id: i64) {
        self.pending = Some(id);
        self.pending_count += 1;
    }
}

/// Runs passes over injected components.
///
/// Passes never overlap: [`run_pass`](Self::run_pass) takes `&mut self`, and
/// [`run_until`](Self::run_until) only sleeps once a pass has returned, so the
/// spacing between passes is the sleep interval plus the pass duration.
#[derive(Debug)]
pub struct PipelineDriver {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn DeliverySink>,
    checkpoints: Arc<dyn CheckpointStore>,
    transformer: RecordTransformer,
    dead_letters: Option<DeadLetterJournal>,
    settings: PipelineSettings,
    state: DriverState,
    passes_completed: u64,
}

impl PipelineDriver {
    pub fn new(
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn DeliverySink>,
        checkpoints: Arc<dyn CheckpointStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            sink,
            checkpoints,
            transformer: RecordTransformer::new(settings.index_prefix.clone()),
            dead_letters: None,
            settings,
            state: DriverState::Idle,
            passes_completed: 0,
        }
    }

    /// Journal skipped records here
    pub fn with_dead_letters(mut self, journal: DeadLetterJournal) -> Self {
        self.dead_letters = Some(journal);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn passes_completed(&self) -> u64 {
        self.passes_completed
    }

    /// Execute one pass. Failures are returned inside the report, never raised.
    pub async fn run_pass(&mut self) -> PassReport {
        self.state = DriverState::Running;
        let started = Instant::now();
        let mut progress = PassProgress::default();

        let mut result = self.process_pending(&mut progress).await;

        // Whatever was delivered before a failure stays delivered; record it.
        let flush = match &result {
            Err(PipelineError::CheckpointIo(_)) => Ok(()),
            _ => self.commit(&mut progress).await,
        };
        result = match (result, flush) {
            (Ok(()), flush) => flush,
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(flush_err)) => {
                error!(
                    error = %flush_err,
                    pending = ?progress.pending,
                    "Could not checkpoint records delivered before the failure; they will be re-delivered"
                );
                Err(err)
            }
        };

        let report = PassReport {
            starting_checkpoint: progress.starting,
            final_checkpoint: progress.committed,
            fetched: progress.fetched,
            delivered: progress.delivered,
            skipped: progress.skipped,
            outcome: match result {
                Ok(()) => PassOutcome::Completed,
                Err(err) => PassOutcome::Aborted(err),
            },
            elapsed: started.elapsed(),
        };

        self.passes_completed += 1;
        self.state = DriverState::Idle;
        report
    }

    /// Run passes until `shutdown` resolves. The signal is only observed
    /// between passes; a pass in flight always runs to its end.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            log_pass!(info, "Starting data processing");
            let report = self.run_pass().await;
            report.log();

            let sleep_secs = self.settings.sleep_interval.as_secs();
            log_pass!(
                info,
                "Data processing complete, sleeping",
                sleep_secs: sleep_secs,
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(passes = self.passes_completed, "Shutdown requested, stopping pipeline");
                    break;
                }
                _ = tokio::time::sleep(self.settings.sleep_interval) => {}
            }
        }
    }

    async fn process_pending(&self, progress: &mut PassProgress) -> PipelineResult<()> {
        let checkpoint = self.checkpoints.read().await?;
        progress.starting = Some(checkpoint);
        progress.committed = Some(checkpoint);
        debug!(checkpoint, "Fetching records after checkpoint");

        let mut records = self.source.fetch_since(checkpoint);
        while let Some(record) = records.try_next().await? {
            progress.fetched += 1;

            let floor = progress.last_seen.unwrap_or(checkpoint);
            if record.id <= floor {
                return Err(PipelineError::source_unavailable(format!(
                    "source yielded id {} after {}; refusing to deliver out of order",
                    record.id, floor
                )));
            }
            progress.last_seen = Some(record.id);

            match self.transformer.transform(&record) {
                Ok(doc) => {
                    let index = self.transformer.partition_key(&doc);
                    let ack = self.sink.deliver(&index, &doc).await?;
                    log_record!(
                        debug,
                        "Record delivered",
                        record_id: record.id,
                        index: ack.index,
                        doc_id: ack.doc_id,
                    );
                    progress.delivered += 1;
                }
                Err(err @ PipelineError::MalformedTimestamp { .. })
                    if self.settings.on_malformed == MalformedPolicy::Skip =>
                {
                    if let Some(journal) = &self.dead_letters {
                        journal.record(&record, &err).await?;
                    }
                    log_record!(
                        error,
                        "Skipping record with malformed timestamp",
                        record_id: record.id,
                        value: record.local_time,
                    );
                    progress.skipped += 1;
                }
                Err(err) => return Err(err),
            }

            progress.handled(record.id);
            if progress.pending_count >= self.settings.checkpoint_every {
                self.commit(progress).await?;
            }
        }

        Ok(())
    }

    /// Persist the highest handled id, if any is outstanding
    async fn commit(&self, progress: &mut PassProgress) -> PipelineResult<()> {
        let Some(id) = progress.pending else {
            return Ok(());
        };

        if let Err(err) = self.checkpoints.write(id).await {
            warn!(checkpoint = id, error = %err, "Checkpoint write failed");
            return Err(err);
        }

        progress.committed = Some(id);
        progress.pending = None;
        progress.pending_count = 0;
        Ok(())
    }
}
