//! # Pipeline Driver
//!
//! Orchestrates passes over the source, transformer, sink and checkpoint.
//!
//! ## Pass
//!
//! 1. Read the checkpoint
//! 2. Stream every record with a greater id, ascending
//! 3. For each record: transform, deliver, then checkpoint its id
//! 4. Report how many records were delivered
//!
//! Any failure stops the pass at that record. Records checkpointed before it
//! stay checkpointed, and the next scheduled pass resumes from there. After a
//! crash at most the in-flight record is delivered twice, or up to
//! `checkpoint_every` records when checkpoint writes are batched.

pub mod bootstrap;
pub mod driver;
pub mod report;

pub use bootstrap::build_driver;
pub use driver::{PipelineDriver, PipelineSettings};
pub use report::{DriverState, PassOutcome, PassReport};
