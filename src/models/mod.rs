//! # Data Model
//!
//! - [`RawRecord`] - one row of the Pi-hole `queries` table as the source query returns it
//! - [`NormalizedDocument`] - the document body sent to Elasticsearch

pub mod document;
pub mod raw_record;

pub use document::NormalizedDocument;
pub use raw_record::RawRecord;
