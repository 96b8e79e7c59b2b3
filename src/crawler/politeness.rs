//! Politeness gate: robots.txt decisions and per-origin pacing
//!
//! One gate is owned by the fetcher for the whole process. For each origin
//! it holds the robots.txt rules (fetched at most once) and the time the last
//! request was released. Requests to the same origin are serialized through
//! `await_turn`; different origins never wait on each other. The robots.txt
//! request itself is spaced the same way and counts as a release.

use crate::config::CrawlerConfig;
use crate::robots::{fetch_robots, RobotsRules};
use crate::state::OriginState;
use crate::url::Origin;
use rand::Rng;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use url::Url;

/// Upper bound applied to a robots.txt Crawl-delay
const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Inter-request interval range, sampled uniformly on every turn
#[derive(Debug, Clone, Copy)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    pub fn new(min_seconds: f64, max_seconds: f64) -> Self {
        let min = Duration::from_secs_f64(min_seconds.max(0.0));
        let max = Duration::from_secs_f64(max_seconds.max(0.0)).max(min);
        Self { min, max }
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

#[derive(Default)]
struct OriginSlot {
    robots: OnceCell<RobotsRules>,
    timing: tokio::sync::Mutex<OriginState>,
}

pub struct PolitenessGate {
    client: Client,
    user_agent: String,
    delay: DelayRange,
    origins: Mutex<HashMap<Origin, Arc<OriginSlot>>>,
}

impl PolitenessGate {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            user_agent: config.user_agent.clone(),
            delay: DelayRange::new(config.delay_min, config.delay_max),
            origins: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, origin: &Origin) -> Arc<OriginSlot> {
        let mut origins = self
            .origins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        origins.entry(origin.clone()).or_default().clone()
    }

    async fn rules(&self, origin: &Origin) -> (Arc<OriginSlot>, RobotsRules) {
        let slot = self.slot(origin);
        let rules = slot
            .robots
            .get_or_init(|| fetch_robots(&self.client, origin, move |url| self.pace(url)))
            .await
            .clone();
        (slot, rules)
    }

    /// Returns whether robots.txt for the URL's origin permits fetching it
    ///
    /// A URL whose origin cannot be determined is refused.
    pub async fn allowed(&self, url: &Url) -> bool {
        let origin = match Origin::of(url) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::warn!("No origin for {}: {}", url, e);
                return false;
            }
        };

        let (_, rules) = self.rules(&origin).await;
        let allowed = rules.is_allowed(url.as_str(), &self.user_agent);
        if !allowed {
            tracing::info!("robots.txt disallows {}", url);
        }
        allowed
    }

    /// Waits until a request to `origin` may be released, then records it
    ///
    /// The interval since the previous release is sampled from the configured
    /// delay range, raised to the origin's Crawl-delay when robots.txt sets
    /// one. Concurrent callers for one origin are released one at a time.
    /// Returns how long this caller slept.
    pub async fn await_turn(&self, origin: &Origin) -> Duration {
        let (slot, rules) = self.rules(origin).await;
        let interval = self.interval(Some(&rules));
        self.release(&slot, origin, interval).await
    }

    /// Spaces a robots.txt request (or one of its redirect hops) to `url`
    ///
    /// While the origin's own rules are still loading only the configured
    /// delay range applies.
    async fn pace(&self, url: Url) {
        let origin = match Origin::of(&url) {
            Ok(origin) => origin,
            Err(_) => return,
        };
        let slot = self.slot(&origin);
        let interval = self.interval(slot.robots.get());
        self.release(&slot, &origin, interval).await;
    }

    fn interval(&self, rules: Option<&RobotsRules>) -> Duration {
        let interval = self.delay.sample();
        match rules.and_then(|rules| rules.crawl_delay(&self.user_agent)) {
            Some(crawl_delay) => interval.max(crawl_delay.min(MAX_CRAWL_DELAY)),
            None => interval,
        }
    }

    async fn release(&self, slot: &OriginSlot, origin: &Origin, interval: Duration) -> Duration {
        let mut timing = slot.timing.lock().await;
        let waited = match timing.time_until_next_request(interval, Instant::now()) {
            Some(wait) => {
                tracing::trace!("Waiting {:?} for {}", wait, origin);
                tokio::time::sleep(wait).await;
                wait
            }
            None => Duration::ZERO,
        };
        timing.record_request(Instant::now());
        waited
    }

    /// Requests released to `origin` so far
    pub async fn requests_released(&self, origin: &Origin) -> u32 {
        self.slot(origin).timing.lock().await.request_count
    }
}
