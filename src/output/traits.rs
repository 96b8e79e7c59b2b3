//! Output handler trait and error types

use crate::pipeline::Listing;
use crate::storage::RecordLogEntry;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A sink for the pipeline's two artifacts
pub trait OutputHandler {
    /// Writes the merged slug -> listing dataset
    fn write_dataset(&self, listings: &BTreeMap<String, Listing>) -> OutputResult<()>;

    /// Writes the record log, oldest entry first
    fn write_record_log(&self, entries: &[RecordLogEntry]) -> OutputResult<()>;
}
