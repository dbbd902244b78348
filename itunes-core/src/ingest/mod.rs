//! Ingestion pipeline: turns a refresh dump into normalized store rows.

pub mod dump;
pub mod pipeline;
pub mod progress;

pub use dump::parse_dump;
pub use pipeline::{ingest, IngestOutcome};
pub use progress::IngestProgress;
