//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the pipeline, including:
//! - Building the HTTP client with the configured user agent
//! - Consulting the politeness gate before every request and redirect hop
//! - Retry logic for transient failures
//! - Manual redirect handling
//! - Error classification
//! - Persisting the fetched document

use crate::config::CrawlerConfig;
use crate::crawler::politeness::PolitenessGate;
use crate::crawler::retry::{parse_retry_after, RetryPolicy};
use crate::crawler::RawDocument;
use crate::storage::{self, SharedStorage, Storage};
use crate::url::{normalize_url, Origin};
use crate::ErrorKind;
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Terminal outcome of a failed fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("robots.txt disallows {url}")]
    RobotsDisallowed { url: String },

    #[error("transient failure for {url} after {attempts} attempts: {reason}")]
    NetworkTransient {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("permanent failure for {url}: {reason}")]
    NetworkPermanent {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("more than {hops} redirects starting at {url}")]
    TooManyRedirects { url: String, hops: u32 },

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to store document: {0}")]
    Storage(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RobotsDisallowed { .. } => ErrorKind::RobotsDisallowed,
            Self::NetworkTransient { .. } => ErrorKind::NetworkTransient,
            Self::NetworkPermanent { .. } | Self::InvalidUrl { .. } => ErrorKind::NetworkPermanent,
            Self::TooManyRedirects { .. } => ErrorKind::TooManyRedirects,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are not followed by the client: the fetcher walks them itself
/// so every hop passes the politeness gate.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout().min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// A successful response at the end of a redirect chain
struct Page {
    final_url: Url,
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// How a single attempt failed
enum AttemptError {
    Transient {
        reason: String,
        retry_after: Option<Duration>,
        throttled: bool,
    },
    Fatal(FetchError),
}

impl AttemptError {
    fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
            retry_after: None,
            throttled: false,
        }
    }
}

/// Retrying fetcher bound to one politeness gate and one document store
pub struct Fetcher {
    client: Client,
    gate: Arc<PolitenessGate>,
    retry: RetryPolicy,
    max_redirects: u32,
    storage: SharedStorage,
}

impl Fetcher {
    pub fn new(
        client: Client,
        gate: Arc<PolitenessGate>,
        config: &CrawlerConfig,
        storage: SharedStorage,
    ) -> Self {
        Self {
            client,
            gate,
            retry: RetryPolicy::from_config(config),
            max_redirects: config.max_redirects,
            storage,
        }
    }

    pub fn gate(&self) -> &Arc<PolitenessGate> {
        &self.gate
    }

    /// Fetches `url` and stores the result under its normalized form
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | robots.txt disallow | Immediate → RobotsDisallowed, no request |
    /// | HTTP 429 | Retry after Retry-After (or backoff) |
    /// | HTTP 5xx | Retry with backoff |
    /// | Timeout / connection error | Retry with backoff |
    /// | Other HTTP 4xx | Immediate → NetworkPermanent |
    /// | Redirect chain > max_redirects | Immediate → TooManyRedirects |
    pub async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let normalized = normalize_url(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !self.gate.allowed(&normalized).await {
            return Err(FetchError::RobotsDisallowed {
                url: normalized.to_string(),
            });
        }

        let mut retry = 0;
        let page = loop {
            match self.attempt(&normalized).await {
                Ok(page) => break page,
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient {
                    reason,
                    retry_after,
                    throttled,
                }) => {
                    if retry >= self.retry.max_retries {
                        return Err(FetchError::NetworkTransient {
                            url: normalized.to_string(),
                            attempts: retry + 1,
                            reason,
                        });
                    }

                    let delay = if throttled {
                        self.retry.throttled(retry, retry_after)
                    } else {
                        self.retry.backoff(retry)
                    };
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        retry + 1,
                        self.retry.max_attempts(),
                        normalized,
                        reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        };

        let doc = RawDocument {
            url: normalized.to_string(),
            final_url: page.final_url.to_string(),
            fetch_timestamp: Utc::now(),
            http_status: page.status,
            content_bytes: page.body,
            content_type: page.content_type,
            robots_allowed: true,
        };

        storage::lock(&self.storage)
            .put_raw_document(&doc)
            .map_err(|e| FetchError::Storage(e.to_string()))?;

        tracing::debug!(
            "Fetched {} (HTTP {}, {} bytes)",
            doc.url,
            doc.http_status,
            doc.content_bytes.len()
        );
        Ok(doc)
    }

    /// One attempt: a request plus the redirect chain it starts
    async fn attempt(&self, start: &Url) -> Result<Page, AttemptError> {
        let mut current = start.clone();

        for hop in 0..=self.max_redirects {
            if hop > 0 && !self.gate.allowed(&current).await {
                return Err(AttemptError::Fatal(FetchError::RobotsDisallowed {
                    url: current.to_string(),
                }));
            }

            let origin = Origin::of(&current).map_err(|e| {
                AttemptError::Fatal(FetchError::InvalidUrl {
                    url: current.to_string(),
                    reason: e.to_string(),
                })
            })?;
            self.gate.await_turn(&origin).await;

            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                Err(e) => return Err(classify_request_error(&current, e)),
            };

            let status = response.status();

            if status.is_redirection() {
                current = redirect_target(&current, &response)?;
                tracing::debug!("Redirect {} → {}", status.as_u16(), current);
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| parse_retry_after(v, Utc::now()));
                return Err(AttemptError::Transient {
                    reason: "HTTP 429".to_string(),
                    retry_after,
                    throttled: true,
                });
            }

            if status.is_server_error() {
                return Err(AttemptError::transient(format!("HTTP {}", status.as_u16())));
            }

            if !status.is_success() {
                return Err(AttemptError::Fatal(FetchError::NetworkPermanent {
                    url: current.to_string(),
                    status: Some(status.as_u16()),
                    reason: format!("HTTP {}", status.as_u16()),
                }));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = match response.bytes().await {
                Ok(body) => body.to_vec(),
                Err(e) => return Err(AttemptError::transient(format!("reading body: {}", e))),
            };

            return Ok(Page {
                final_url: current,
                status: status.as_u16(),
                content_type,
                body,
            });
        }

        Err(AttemptError::Fatal(FetchError::TooManyRedirects {
            url: start.to_string(),
            hops: self.max_redirects,
        }))
    }
}

fn classify_request_error(url: &Url, e: reqwest::Error) -> AttemptError {
    if e.is_builder() {
        return AttemptError::Fatal(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        });
    }
    if e.is_timeout() {
        AttemptError::transient("request timeout")
    } else if e.is_connect() {
        AttemptError::transient(format!("connection failed: {}", e))
    } else {
        AttemptError::transient(e.to_string())
    }
}

fn redirect_target(current: &Url, response: &reqwest::Response) -> Result<Url, AttemptError> {
    let status = response.status().as_u16();
    let permanent = |reason: String| {
        AttemptError::Fatal(FetchError::NetworkPermanent {
            url: current.to_string(),
            status: Some(status),
            reason,
        })
    };

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| permanent(format!("HTTP {} without Location", status)))?;

    let target = current
        .join(location)
        .map_err(|e| permanent(format!("bad Location '{}': {}", location, e)))?;

    if target.scheme() != "http" && target.scheme() != "https" {
        return Err(permanent(format!("redirect to unsupported scheme {}", target.scheme())));
    }

    Ok(target)
}
