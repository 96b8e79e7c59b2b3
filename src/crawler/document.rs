use crate::url::document_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched page as it came off the wire
///
/// Stored once per normalized URL; a later fetch of the same URL replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Normalized URL that was requested
    pub url: String,

    /// URL that answered after following redirects
    pub final_url: String,

    pub fetch_timestamp: DateTime<Utc>,

    pub http_status: u16,

    /// Body bytes; left out of the record log
    #[serde(skip_serializing, default)]
    pub content_bytes: Vec<u8>,

    pub content_type: Option<String>,

    pub robots_allowed: bool,
}

impl RawDocument {
    /// Storage key derived from the normalized URL
    pub fn key(&self) -> String {
        document_key(&self.url)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content_bytes).into_owned()
    }

    /// True when the content type names HTML, or is missing
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("html") || ct.starts_with("text/plain")
            }
        }
    }
}
