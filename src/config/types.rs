use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the scraper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the seed list (one URL per line, `#` comments)
    #[serde(rename = "seeds-path", default = "default_seeds_path")]
    pub seeds_path: String,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub pipeline: PipelineFlags,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seeds_path: default_seeds_path(),
            crawler: CrawlerConfig::default(),
            summarizer: SummarizerConfig::default(),
            pipeline: PipelineFlags::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Fetch stage behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of seed URLs processed per run (0 = unlimited)
    #[serde(rename = "max-urls")]
    pub max_urls: usize,

    /// Lower bound of the per-origin politeness interval (seconds)
    #[serde(rename = "delay-min")]
    pub delay_min: f64,

    /// Upper bound of the per-origin politeness interval (seconds)
    #[serde(rename = "delay-max")]
    pub delay_max: f64,

    /// Maximum number of URLs in flight
    pub concurrency: usize,

    /// Timeout for a single HTTP attempt (seconds)
    #[serde(rename = "request-timeout-seconds")]
    pub request_timeout_seconds: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Maximum redirect hops before giving up
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// First backoff delay (seconds); doubles on each retry
    #[serde(rename = "backoff-base-seconds")]
    pub backoff_base_seconds: f64,

    /// Random fraction added on top of each backoff delay
    #[serde(rename = "backoff-jitter")]
    pub backoff_jitter: f64,

    /// Ceiling for backoff and Retry-After waits (seconds)
    #[serde(rename = "backoff-max-seconds")]
    pub backoff_max_seconds: f64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_urls: 0,
            delay_min: 0.8,
            delay_max: 2.0,
            concurrency: 2,
            request_timeout_seconds: 30,
            max_retries: 3,
            max_redirects: 10,
            backoff_base_seconds: 1.0,
            backoff_jitter: 0.25,
            backoff_max_seconds: 60.0,
            user_agent: "toytoons-scraper/0.1".to_string(),
        }
    }
}

/// Summarization stage behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    #[serde(rename = "sentence-count")]
    pub sentence_count: usize,

    /// Ollama-compatible endpoint; absent means extractive summaries only
    #[serde(rename = "generation-backend-endpoint")]
    pub generation_backend_endpoint: Option<String>,

    pub model: String,

    /// Characters of text sent to the backend per request
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    #[serde(rename = "backend-timeout-seconds")]
    pub backend_timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            sentence_count: 2,
            generation_backend_endpoint: None,
            model: "llama3.2".to_string(),
            chunk_size: 4000,
            backend_timeout_seconds: 60,
        }
    }
}

/// Force flags requesting a stage redo regardless of recorded progress
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PipelineFlags {
    #[serde(rename = "force-fetch")]
    pub force_fetch: bool,

    #[serde(rename = "force-parse")]
    pub force_parse: bool,

    #[serde(rename = "force-summarize")]
    pub force_summarize: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path of the exported slug -> listing JSON map
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,

    /// Path of the exported record log (JSON lines)
    #[serde(rename = "record-log-path")]
    pub record_log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "toytoons.db".to_string(),
            dataset_path: "listings.json".to_string(),
            record_log_path: "records.jsonl".to_string(),
        }
    }
}

fn default_seeds_path() -> String {
    "seeds.txt".to_string()
}
