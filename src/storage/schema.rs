//! Database schema definitions

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Raw documents, one per normalized URL; overwritten on re-fetch
CREATE TABLE IF NOT EXISTS raw_documents (
    doc_key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    final_url TEXT NOT NULL,
    fetch_timestamp TEXT NOT NULL,
    http_status INTEGER NOT NULL,
    content_type TEXT,
    content_bytes BLOB NOT NULL,
    robots_allowed INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_raw_documents_url ON raw_documents(url);

-- Idempotence ledger: what has already happened to each URL
CREATE TABLE IF NOT EXISTS pipeline_state (
    url TEXT PRIMARY KEY,
    stage TEXT NOT NULL,
    last_attempt TEXT,
    last_error TEXT,
    error_kind TEXT
);

CREATE INDEX IF NOT EXISTS idx_pipeline_state_stage ON pipeline_state(stage);

-- Durable parse and summarize outputs
CREATE TABLE IF NOT EXISTS extracted_records (
    url TEXT PRIMARY KEY,
    record_json TEXT NOT NULL,
    summary TEXT,
    updated_at TEXT NOT NULL
);

-- Merged dataset: slug -> listing
CREATE TABLE IF NOT EXISTS listings (
    slug TEXT PRIMARY KEY,
    source_url TEXT NOT NULL UNIQUE,
    first_seen TEXT NOT NULL,
    listing_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Append-only per-document record log
CREATE TABLE IF NOT EXISTS record_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    stage TEXT NOT NULL,
    logged_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_record_log_url ON record_log(url);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
