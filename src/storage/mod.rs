//! Storage module for persisting pipeline data
//!
//! This module handles all database operations for the pipeline, including:
//! - Raw document storage keyed by normalized URL
//! - The per-URL idempotence ledger
//! - Durable extraction and summary outputs
//! - The merged slug -> listing dataset
//! - The append-only record log

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::extract::ExtractedRecord;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between concurrent pipeline tasks
///
/// Lock holders only run short synchronous SQLite statements and never hold
/// the guard across an `.await`.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Opens (or creates) the database at `path` and wraps it for sharing
pub fn open_shared(path: &Path) -> StorageResult<SharedStorage> {
    Ok(Arc::new(Mutex::new(SqliteStorage::new(path)?)))
}

/// Locks shared storage, recovering the guard if a holder panicked
pub fn lock(storage: &SharedStorage) -> MutexGuard<'_, SqliteStorage> {
    storage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An extraction together with its summary, if one was produced
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: ExtractedRecord,
    pub summary: Option<String>,
}

/// One row of the record log
#[derive(Debug, Clone, Serialize)]
pub struct RecordLogEntry {
    pub id: i64,
    pub url: String,
    pub stage: String,
    pub logged_at: String,
    pub payload: serde_json::Value,
}
