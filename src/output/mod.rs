//! Output module for status reports and dataset exports
//!
//! This module handles:
//! - Printing the per-URL status view from the pipeline ledger
//! - Exporting the merged dataset and the record log

mod export;
pub mod stats;
mod traits;

pub use export::JsonExporter;
pub use stats::{format_status_line, print_status, StatusStatistics};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::storage::Storage;

/// Exports both artifacts from storage through `handler`
pub fn export_all(storage: &dyn Storage, handler: &dyn OutputHandler) -> OutputResult<()> {
    let listings = storage.load_listings()?;
    handler.write_dataset(&listings)?;

    let entries = storage.record_log()?;
    handler.write_record_log(&entries)?;

    Ok(())
}

/// Loads ledger statistics from storage
pub fn load_status(storage: &dyn Storage) -> OutputResult<(Vec<crate::state::PipelineState>, StatusStatistics)> {
    let states = storage.all_states()?;
    let listings = storage.load_listings()?.len();
    let stats = StatusStatistics::from_states(&states, listings);
    Ok((states, stats))
}
