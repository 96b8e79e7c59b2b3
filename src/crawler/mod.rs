//! Crawler module: polite, retrying acquisition of raw documents
//!
//! This module contains the acquisition half of the pipeline, including:
//! - The politeness gate (robots.txt cache and per-origin pacing)
//! - The retry schedule for transient failures
//! - HTTP fetching with manual redirect handling
//! - The stored raw document type

mod document;
mod fetcher;
mod politeness;
mod retry;

pub use document::RawDocument;
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use politeness::{DelayRange, PolitenessGate};
pub use retry::{parse_retry_after, RetryPolicy};
