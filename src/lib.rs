//! Toytoons scraper: a polite acquisition pipeline for cartoon and toy line pages
//!
//! This crate fetches seed pages while respecting robots.txt and per-origin
//! rate limits, extracts structured show/toyline records from arbitrary HTML,
//! summarizes them with a model backend or a deterministic TextRank fallback,
//! and merges the results into a slug-keyed listing dataset.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod robots;
pub mod state;
pub mod storage;
pub mod summarize;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Failure taxonomy reported through the status view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RobotsDisallowed,
    NetworkTransient,
    NetworkPermanent,
    TooManyRedirects,
    ExtractionDegraded,
    SummarizationBackendUnavailable,
    SlugCollision,
    /// Local storage or IO fault, not a property of the remote document
    Internal,
}

impl ErrorKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::RobotsDisallowed => "robots_disallowed",
            Self::NetworkTransient => "network_transient",
            Self::NetworkPermanent => "network_permanent",
            Self::TooManyRedirects => "too_many_redirects",
            Self::ExtractionDegraded => "extraction_degraded",
            Self::SummarizationBackendUnavailable => "summarization_backend_unavailable",
            Self::SlugCollision => "slug_collision",
            Self::Internal => "internal",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "robots_disallowed" => Some(Self::RobotsDisallowed),
            "network_transient" => Some(Self::NetworkTransient),
            "network_permanent" => Some(Self::NetworkPermanent),
            "too_many_redirects" => Some(Self::TooManyRedirects),
            "extraction_degraded" => Some(Self::ExtractionDegraded),
            "summarization_backend_unavailable" => Some(Self::SummarizationBackendUnavailable),
            "slug_collision" => Some(Self::SlugCollision),
            "internal" => Some(Self::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

// Re-export commonly used types
pub use config::Config;
pub use extract::{extract, ExtractedRecord};
pub use pipeline::{Listing, Orchestrator};
pub use state::{PipelineStage, PipelineState};
pub use summarize::Summarizer;
pub use url::{normalize_url, Origin};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_roundtrip() {
        for kind in [
            ErrorKind::RobotsDisallowed,
            ErrorKind::NetworkTransient,
            ErrorKind::NetworkPermanent,
            ErrorKind::TooManyRedirects,
            ErrorKind::ExtractionDegraded,
            ErrorKind::SummarizationBackendUnavailable,
            ErrorKind::SlugCollision,
            ErrorKind::Internal,
        ] {
            assert_eq!(ErrorKind::from_db_string(kind.to_db_string()), Some(kind));
        }
        assert_eq!(ErrorKind::from_db_string("bogus"), None);
    }
}
