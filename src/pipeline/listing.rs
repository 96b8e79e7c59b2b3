use crate::extract::ExtractedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the merged dataset
///
/// Serializes flat: the record's fields sit next to `slug`,
/// `description_summary` and `first_seen`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub slug: String,

    #[serde(flatten)]
    pub record: ExtractedRecord,

    pub description_summary: String,

    /// When this slug was first produced; carried forward on every rewrite
    pub first_seen: DateTime<Utc>,
}
