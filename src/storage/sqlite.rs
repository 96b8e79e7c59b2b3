//! SQLite storage implementation

use crate::crawler::RawDocument;
use crate::extract::ExtractedRecord;
use crate::pipeline::Listing;
use crate::state::{PipelineStage, PipelineState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RecordLogEntry, StoredRecord};
use crate::ErrorKind;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{}': {}", value, e)))
}

fn state_from_row(
    url: String,
    stage: String,
    last_attempt: Option<String>,
    last_error: Option<String>,
    error_kind: Option<String>,
) -> StorageResult<PipelineState> {
    let stage_completed = PipelineStage::from_db_string(&stage)
        .ok_or_else(|| StorageError::Corrupt(format!("unknown stage '{}' for {}", stage, url)))?;
    Ok(PipelineState {
        url,
        stage_completed,
        last_attempt,
        last_error,
        error_kind: error_kind.as_deref().and_then(ErrorKind::from_db_string),
    })
}

// Statement helpers shared by single writes and the stage transactions

fn upsert_state(conn: &Connection, state: &PipelineState) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO pipeline_state (url, stage, last_attempt, last_error, error_kind)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(url) DO UPDATE SET
            stage = excluded.stage,
            last_attempt = excluded.last_attempt,
            last_error = excluded.last_error,
            error_kind = excluded.error_kind",
        params![
            state.url,
            state.stage_completed.to_db_string(),
            state.last_attempt,
            state.last_error,
            state.error_kind.map(|k| k.to_db_string()),
        ],
    )?;
    Ok(())
}

fn insert_extracted(conn: &Connection, url: &str, record: &ExtractedRecord) -> StorageResult<()> {
    let json = serde_json::to_string(record)?;
    conn.execute(
        "INSERT OR REPLACE INTO extracted_records (url, record_json, summary, updated_at)
         VALUES (?1, ?2, NULL, ?3)",
        params![url, json, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn update_summary(conn: &Connection, url: &str, summary: &str) -> StorageResult<()> {
    let updated = conn.execute(
        "UPDATE extracted_records SET summary = ?1, updated_at = ?2 WHERE url = ?3",
        params![summary, Utc::now().to_rfc3339(), url],
    )?;
    if updated == 0 {
        return Err(StorageError::NotFound(format!("extracted record for {}", url)));
    }
    Ok(())
}

fn insert_log(
    conn: &Connection,
    url: &str,
    stage: &str,
    payload: &serde_json::Value,
) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO record_log (url, stage, logged_at, payload) VALUES (?1, ?2, ?3, ?4)",
        params![url, stage, Utc::now().to_rfc3339(), payload.to_string()],
    )?;
    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Raw Documents =====

    fn put_raw_document(&mut self, doc: &RawDocument) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO raw_documents
             (doc_key, url, final_url, fetch_timestamp, http_status, content_type, content_bytes, robots_allowed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                doc.key(),
                doc.url,
                doc.final_url,
                doc.fetch_timestamp.to_rfc3339(),
                doc.http_status,
                doc.content_type,
                doc.content_bytes,
                doc.robots_allowed,
            ],
        )?;
        Ok(())
    }

    fn get_raw_document(&self, doc_key: &str) -> StorageResult<Option<RawDocument>> {
        let row = self
            .conn
            .query_row(
                "SELECT url, final_url, fetch_timestamp, http_status, content_type, content_bytes, robots_allowed
                 FROM raw_documents WHERE doc_key = ?1",
                params![doc_key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u16>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                        row.get::<_, bool>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((url, final_url, fetched, http_status, content_type, content_bytes, robots_allowed)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(RawDocument {
            url,
            final_url,
            fetch_timestamp: parse_timestamp(&fetched)?,
            http_status,
            content_bytes,
            content_type,
            robots_allowed,
        }))
    }

    fn count_raw_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_documents", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    // ===== Pipeline State =====

    fn get_state(&self, url: &str) -> StorageResult<Option<PipelineState>> {
        let row = self
            .conn
            .query_row(
                "SELECT url, stage, last_attempt, last_error, error_kind
                 FROM pipeline_state WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        row.map(|(url, stage, attempt, error, kind)| state_from_row(url, stage, attempt, error, kind))
            .transpose()
    }

    fn put_state(&mut self, state: &PipelineState) -> StorageResult<()> {
        upsert_state(&self.conn, state)
    }

    fn all_states(&self) -> StorageResult<Vec<PipelineState>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, stage, last_attempt, last_error, error_kind
             FROM pipeline_state ORDER BY url",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<Result<Vec<(String, String, Option<String>, Option<String>, Option<String>)>, _>>()?;

        rows.into_iter()
            .map(|(url, stage, attempt, error, kind)| state_from_row(url, stage, attempt, error, kind))
            .collect()
    }

    // ===== Extracted Records =====

    fn commit_extraction(
        &mut self,
        state: &PipelineState,
        record: &ExtractedRecord,
        payload: &serde_json::Value,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        insert_extracted(&tx, &state.url, record)?;
        upsert_state(&tx, state)?;
        insert_log(&tx, &state.url, state.stage_completed.to_db_string(), payload)?;
        tx.commit()?;
        Ok(())
    }

    fn commit_summary(
        &mut self,
        state: &PipelineState,
        summary: &str,
        payload: &serde_json::Value,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        update_summary(&tx, &state.url, summary)?;
        upsert_state(&tx, state)?;
        insert_log(&tx, &state.url, state.stage_completed.to_db_string(), payload)?;
        tx.commit()?;
        Ok(())
    }

    fn get_extracted(&self, url: &str) -> StorageResult<Option<StoredRecord>> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT record_json, summary FROM extracted_records WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((json, summary)) => Ok(Some(StoredRecord {
                record: serde_json::from_str(&json)?,
                summary,
            })),
            None => Ok(None),
        }
    }

    // ===== Listings =====

    fn load_listings(&self) -> StorageResult<BTreeMap<String, Listing>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slug, listing_json FROM listings ORDER BY slug")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut listings = BTreeMap::new();
        for (slug, json) in rows {
            let listing: Listing = serde_json::from_str(&json)?;
            listings.insert(slug, listing);
        }
        Ok(listings)
    }

    fn put_listing(&mut self, listing: &Listing) -> StorageResult<()> {
        let json = serde_json::to_string(listing)?;
        self.conn.execute(
            "INSERT INTO listings (slug, source_url, first_seen, listing_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slug) DO UPDATE SET
                source_url = excluded.source_url,
                listing_json = excluded.listing_json,
                updated_at = excluded.updated_at",
            params![
                listing.slug,
                listing.record.source_url,
                listing.first_seen.to_rfc3339(),
                json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ===== Record Log =====

    fn append_record_log(
        &mut self,
        url: &str,
        stage: &str,
        payload: &serde_json::Value,
    ) -> StorageResult<()> {
        insert_log(&self.conn, url, stage, payload)
    }

    fn record_log(&self) -> StorageResult<Vec<RecordLogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url, stage, logged_at, payload FROM record_log ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, url, stage, logged_at, payload)| {
                Ok(RecordLogEntry {
                    id,
                    url,
                    stage,
                    logged_at,
                    payload: serde_json::from_str(&payload)?,
                })
            })
            .collect()
    }
}
