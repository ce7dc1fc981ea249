#![allow(clippy::doc_markdown)] // Allow technical terms like SQLite, Elasticsearch in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pi-hole Shipper
//!
//! Checkpointed log shipping from the Pi-hole FTL database to monthly
//! Elasticsearch indices.
//!
//! ## Overview
//!
//! Every interval the shipper reads the id of the last delivered DNS query,
//! streams all newer rows from the `queries` table in id order, turns each into
//! a document and indexes it into `pihole-dns-logs-YYYY-MM`. The checkpoint is
//! advanced after each acknowledged delivery, so a restart resumes where the
//! previous process stopped and never skips a record.
//!
//! ## Module Organization
//!
//! - [`checkpoint`] - durable resume point
//! - [`source`] - ordered reads from the log store
//! - [`transform`] - record → document and partition routing
//! - [`sink`] - delivery to the search index
//! - [`pipeline`] - pass orchestration and the periodic loop
//! - [`config`] - layered configuration
//! - [`error`] - pass error taxonomy
//! - [`logging`] - stdout + rolling file logging
//! - [`dead_letter`] - journal of skipped records
//! - [`lock`] - single-instance guard
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pihole_shipper::config::ConfigManager;
//! use pihole_shipper::pipeline::build_driver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load().into_config();
//! let mut driver = build_driver(&config)?;
//!
//! let report = driver.run_pass().await;
//! println!("delivered {} records", report.delivered);
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod dead_letter;
pub mod error;
pub mod lock;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod transform;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use config::{ConfigManager, MalformedPolicy, ShipperConfig};
pub use error::{PipelineError, PipelineResult};
pub use models::{NormalizedDocument, RawRecord};
pub use pipeline::{PassOutcome, PassReport, PipelineDriver, PipelineSettings};
pub use sink::{DeliveryAck, DeliverySink, ElasticsearchSink, MemorySink};
pub use source::{MemorySource, RecordSource, SqliteLogSource};
pub use transform::{transform, RecordTransformer};
