//! Status statistics from the pipeline ledger
//!
//! Builds the per-URL status view and aggregate counts, and prints them.

use crate::state::{PipelineStage, PipelineState};
use crate::ErrorKind;
use std::collections::BTreeMap;

/// Aggregate view of the ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusStatistics {
    pub total_urls: usize,

    /// URL count per completed stage
    pub urls_by_stage: BTreeMap<PipelineStage, usize>,

    /// Failed URL count per error kind
    pub errors_by_kind: BTreeMap<String, usize>,

    pub listings: usize,
}

impl StatusStatistics {
    pub fn from_states(states: &[PipelineState], listings: usize) -> Self {
        let mut stats = Self {
            total_urls: states.len(),
            listings,
            ..Default::default()
        };

        for state in states {
            *stats.urls_by_stage.entry(state.stage_completed).or_default() += 1;
            if state.is_failed() {
                let kind = state
                    .error_kind
                    .map(|k| k.to_db_string().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                *stats.errors_by_kind.entry(kind).or_default() += 1;
            }
        }

        stats
    }

    pub fn completed(&self) -> usize {
        self.urls_by_stage
            .get(&PipelineStage::Summarized)
            .copied()
            .unwrap_or(0)
    }
}

/// One line of the status table: `stage  kind  url  error`
pub fn format_status_line(state: &PipelineState) -> String {
    let kind = state.error_kind.map(|k: ErrorKind| k.to_db_string()).unwrap_or("-");
    let mut line = format!("{:<10}  {:<20}  {}", state.stage_completed, kind, state.url);
    if let Some(error) = &state.last_error {
        line.push_str("  ");
        line.push_str(error);
    }
    line
}

/// Prints the per-URL table followed by totals
pub fn print_status(states: &[PipelineState], stats: &StatusStatistics) {
    println!("=== Pipeline Status ===\n");

    println!("{:<10}  {:<20}  URL / last error", "STAGE", "ERROR KIND");
    for state in states {
        println!("{}", format_status_line(state));
    }
    println!();

    println!("URLs by Stage:");
    for (stage, count) in &stats.urls_by_stage {
        let percentage = if stats.total_urls > 0 {
            (*count as f64 / stats.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", stage, count, percentage);
    }
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Errors by Kind:");
        for (kind, count) in &stats.errors_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Completed: {} / {} URLs summarized, {} listings in dataset",
        stats.completed(),
        stats.total_urls,
        stats.listings
    );
}
