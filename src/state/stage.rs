/// Pipeline stage definitions for the per-URL idempotence ledger
///
/// Stages are ordered: a URL at `Parsed` has also completed `Fetched`.
use crate::ErrorKind;
use std::fmt;

/// The last stage a URL completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineStage {
    /// Nothing durable exists for this URL yet
    None,

    /// The raw document is stored
    Fetched,

    /// The extracted record is stored
    Parsed,

    /// The summary is stored; the URL is ready to merge
    Summarized,
}

impl PipelineStage {
    /// Returns the stage that follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::None => Some(Self::Fetched),
            Self::Fetched => Some(Self::Parsed),
            Self::Parsed => Some(Self::Summarized),
            Self::Summarized => None,
        }
    }

    /// Returns true if `stage` still has to run for a URL at this stage
    pub fn is_behind(&self, stage: Self) -> bool {
        *self < stage
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fetched => "fetched",
            Self::Parsed => "parsed",
            Self::Summarized => "summarized",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "fetched" => Some(Self::Fetched),
            "parsed" => Some(Self::Parsed),
            "summarized" => Some(Self::Summarized),
            _ => None,
        }
    }

    pub fn all_stages() -> Vec<Self> {
        vec![Self::None, Self::Fetched, Self::Parsed, Self::Summarized]
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Per-URL ledger row: what has already happened to a URL
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    /// Normalized URL
    pub url: String,

    pub stage_completed: PipelineStage,

    /// RFC 3339 timestamp of the last stage attempt
    pub last_attempt: Option<String>,

    pub last_error: Option<String>,

    pub error_kind: Option<ErrorKind>,
}

impl PipelineState {
    /// A fresh ledger row for a URL never attempted before
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stage_completed: PipelineStage::None,
            last_attempt: None,
            last_error: None,
            error_kind: None,
        }
    }

    /// True when the last attempt on this URL failed
    pub fn is_failed(&self) -> bool {
        self.last_error.is_some()
    }
}
