//! Durable persistence for the paper collection.
//!
//! The collection lives in a single JSON file: loaded once at process
//! start, mutated in memory during ingestion, and written back at most
//! once at the end of a run.

pub mod local;

// Re-export for convenience
pub use local::{PaperDb, PaperStore};
