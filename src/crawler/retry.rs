//! Retry schedule for transient fetch failures

use crate::config::CrawlerConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with proportional jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    pub base: Duration,

    /// Cap for both backoff delays and Retry-After values
    pub max: Duration,

    /// Fraction of each delay added at random, in [0, 1]
    pub jitter: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: Duration::from_secs_f64(config.backoff_base_seconds.max(0.0)),
            max: Duration::from_secs_f64(config.backoff_max_seconds.max(0.0)),
            jitter: config.backoff_jitter.clamp(0.0, 1.0),
        }
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Un-jittered delay before retry `retry` (0-based): `min(base * 2^retry, max)`
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = 2f64.powi(retry.min(30) as i32);
        let secs = (self.base.as_secs_f64() * factor).min(self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Delay before retry `retry` with jitter applied
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let factor = 1.0 + rand::rng().random_range(0.0..self.jitter);
        base.mul_f64(factor)
    }

    /// Delay for a 429 response: the server's Retry-After when usable, else backoff
    pub fn throttled(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(wait) => wait.min(self.max),
            None => self.backoff(retry),
        }
    }
}

/// Parses a Retry-After header value
///
/// Accepts delta-seconds or an HTTP-date. A date in the past yields zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let when = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((when - now).to_std().unwrap_or(Duration::ZERO))
}
