//! Robots.txt handling module
//!
//! Fetching is default-allow: any failure to obtain a robots.txt yields
//! permissive rules and a log line, never an error.

mod parser;

pub use parser::RobotsRules;

use crate::url::Origin;
use reqwest::header::LOCATION;
use reqwest::{Client, Response};
use std::future::Future;
use url::Url;

/// Redirect hops followed for robots.txt before it counts as unavailable
pub const MAX_ROBOTS_REDIRECTS: u32 = 5;

/// Fetches and parses robots.txt for an origin
///
/// `before_request` is awaited before every request, including each redirect
/// hop, so the caller can space these requests like any other.
///
/// Redirects are followed up to [`MAX_ROBOTS_REDIRECTS`] hops, resolving
/// `Location` against the URL that returned it. A missing file (4xx) allows
/// everything silently. Network errors, 5xx responses, unreadable bodies and
/// exhausted redirect chains leave robots.txt unavailable, which also allows
/// everything but is logged at `warn`.
pub async fn fetch_robots<F, Fut>(client: &Client, origin: &Origin, mut before_request: F) -> RobotsRules
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut current = match origin.robots_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}; allowing all", origin, e);
            return RobotsRules::allow_all();
        }
    };
    let mut hops = 0;

    loop {
        before_request(current.clone()).await;

        let response = match client.get(current.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}; allowing all", current, e);
                return RobotsRules::allow_all();
            }
        };

        let status = response.status();
        if status.is_redirection() {
            let Some(target) = redirect_target(&current, &response) else {
                tracing::warn!(
                    "robots.txt at {} redirected (HTTP {}) without a usable Location; allowing all",
                    current,
                    status.as_u16()
                );
                return RobotsRules::allow_all();
            };
            if hops >= MAX_ROBOTS_REDIRECTS {
                tracing::warn!(
                    "robots.txt for {} redirected more than {} times; unavailable, allowing all",
                    origin,
                    MAX_ROBOTS_REDIRECTS
                );
                return RobotsRules::allow_all();
            }
            hops += 1;
            tracing::debug!("robots.txt {} redirects to {}", current, target);
            current = target;
            continue;
        }

        if status.is_client_error() {
            tracing::debug!("No robots.txt at {} (HTTP {})", current, status.as_u16());
            return RobotsRules::allow_all();
        }
        if !status.is_success() {
            tracing::warn!(
                "robots.txt at {} returned HTTP {}; allowing all",
                current,
                status.as_u16()
            );
            return RobotsRules::allow_all();
        }

        return match response.text().await {
            Ok(body) => {
                tracing::debug!("Loaded robots.txt for {} ({} bytes)", origin, body.len());
                RobotsRules::from_content(&body)
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}; allowing all", current, e);
                RobotsRules::allow_all()
            }
        };
    }
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}
