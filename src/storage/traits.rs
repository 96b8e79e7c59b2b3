//! Storage traits and error types

use crate::crawler::RawDocument;
use crate::extract::ExtractedRecord;
use crate::pipeline::Listing;
use crate::state::PipelineState;
use crate::storage::{RecordLogEntry, StoredRecord};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is keyed (by document key, URL, or slug) so that writers of
/// different keys never contend on the same row.
pub trait Storage {
    // ===== Raw Documents =====

    /// Stores a raw document, replacing any prior fetch of the same URL
    fn put_raw_document(&mut self, doc: &RawDocument) -> StorageResult<()>;

    /// Loads a raw document by its document key
    fn get_raw_document(&self, doc_key: &str) -> StorageResult<Option<RawDocument>>;

    fn count_raw_documents(&self) -> StorageResult<u64>;

    // ===== Pipeline State =====

    fn get_state(&self, url: &str) -> StorageResult<Option<PipelineState>>;

    /// Inserts or replaces the ledger row for `state.url`
    fn put_state(&mut self, state: &PipelineState) -> StorageResult<()>;

    /// All ledger rows ordered by URL
    fn all_states(&self) -> StorageResult<Vec<PipelineState>>;

    // ===== Extracted Records =====

    fn get_extracted(&self, url: &str) -> StorageResult<Option<StoredRecord>>;

    /// Stores a fresh extraction, the ledger row and its log entry atomically
    ///
    /// Any previous summary for the URL is dropped. The log entry's stage is
    /// `state.stage_completed`.
    fn commit_extraction(
        &mut self,
        state: &PipelineState,
        record: &ExtractedRecord,
        payload: &serde_json::Value,
    ) -> StorageResult<()>;

    /// Attaches a summary and advances the ledger row atomically
    fn commit_summary(
        &mut self,
        state: &PipelineState,
        summary: &str,
        payload: &serde_json::Value,
    ) -> StorageResult<()>;

    // ===== Listings =====

    /// Loads the merged dataset keyed by slug
    fn load_listings(&self) -> StorageResult<BTreeMap<String, Listing>>;

    /// Inserts or replaces the listing stored under `listing.slug`
    fn put_listing(&mut self, listing: &Listing) -> StorageResult<()>;

    // ===== Record Log =====

    /// Appends an entry; the log has no update or delete path
    fn append_record_log(
        &mut self,
        url: &str,
        stage: &str,
        payload: &serde_json::Value,
    ) -> StorageResult<()>;

    /// All log entries in insertion order
    fn record_log(&self) -> StorageResult<Vec<RecordLogEntry>>;
}
