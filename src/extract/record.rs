use serde::{Deserialize, Serialize};

/// An image found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute URL, resolved against the document's final URL
    pub url: String,

    /// Alt text or title attribute, possibly empty
    pub description: String,
}

/// Structured fields pulled from one raw document
///
/// Optional fields stay `None` when no rule found a value; they are omitted
/// from serialized output rather than written as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub source_url: String,

    pub source_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toyline_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_aired: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_toyline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio_network: Option<String>,

    /// Distinct names in order of first appearance
    #[serde(default)]
    pub notable_characters: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image_url: Option<String>,

    #[serde(default)]
    pub additional_images: Vec<ImageRef>,

    #[serde(default)]
    pub raw_text_for_summary: String,

    /// One human-readable line per heuristic that fell short
    #[serde(default)]
    pub parse_notes: Vec<String>,
}

impl ExtractedRecord {
    /// Title a listing slug is derived from: show title, else toyline name
    pub fn display_title(&self) -> Option<&str> {
        self.show_title
            .as_deref()
            .or(self.toyline_name.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    /// True when at least one note records a degraded extraction
    pub fn is_degraded(&self) -> bool {
        !self.parse_notes.is_empty()
    }
}
