//! # Pipeline Bootstrap
//!
//! Wires the production components from a loaded [`ShipperConfig`]. Each
//! component is built exactly once here and owned by the driver afterwards.

use std::sync::Arc;
use tracing::info;

use super::driver::{PipelineDriver, PipelineSettings};
use crate::checkpoint::FileCheckpointStore;
use crate::config::{ConfigResult, ShipperConfig};
use crate::dead_letter::DeadLetterJournal;
use crate::sink::{ElasticsearchSink, ElasticsearchSinkConfig};
use crate::source::SqliteLogSource;

/// Build a driver over the FTL database, Elasticsearch and the checkpoint file
pub fn build_driver(config: &ShipperConfig) -> ConfigResult<PipelineDriver> {
    config.validate()?;

    let source = SqliteLogSource::open_lazy(&config.database_path);
    let sink = ElasticsearchSink::new(ElasticsearchSinkConfig::from(config))?;
    let checkpoints = FileCheckpointStore::new(&config.checkpoint_path);

    info!(
        database_path = %config.database_path.display(),
        checkpoint_path = %config.checkpoint_path.display(),
        destination = %sink.base_url(),
        index_prefix = %config.index_prefix,
        checkpoint_every = config.checkpoint_every,
        on_malformed = ?config.on_malformed,
        "Pipeline components initialized"
    );

    let mut driver = PipelineDriver::new(
        Arc::new(source),
        Arc::new(sink),
        Arc::new(checkpoints),
        PipelineSettings::from(config),
    );

    if let Some(path) = &config.dead_letter_path {
        info!(dead_letter_path = %path.display(), "Skipped records will be journaled");
        driver = driver.with_dead_letters(DeadLetterJournal::new(path));
    }

    Ok(driver)
}
