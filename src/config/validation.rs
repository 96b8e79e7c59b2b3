use crate::config::types::{Config, CrawlerConfig, OutputConfig, SummarizerConfig};
use crate::ConfigError;
use url::Url;

/// Longest backoff or politeness wait a config may ask for (seconds)
const MAX_WAIT_SECONDS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_summarizer_config(&config.summarizer)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.delay_min.is_finite() || config.delay_min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_min must be a non-negative number of seconds, got {}",
            config.delay_min
        )));
    }

    if !config.delay_max.is_finite()
        || config.delay_max < config.delay_min
        || config.delay_max > MAX_WAIT_SECONDS
    {
        return Err(ConfigError::Validation(format!(
            "delay_max must be between delay_min ({}) and {}, got {}",
            config.delay_min, MAX_WAIT_SECONDS, config.delay_max
        )));
    }

    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_seconds must be >= 1".to_string(),
        ));
    }

    if config.max_redirects < 1 {
        return Err(ConfigError::Validation(
            "max_redirects must be >= 1".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.backoff_jitter) {
        return Err(ConfigError::Validation(format!(
            "backoff_jitter must be between 0 and 1, got {}",
            config.backoff_jitter
        )));
    }

    if !config.backoff_base_seconds.is_finite()
        || config.backoff_base_seconds < 0.0
        || !config.backoff_max_seconds.is_finite()
        || config.backoff_max_seconds < config.backoff_base_seconds
        || config.backoff_max_seconds > MAX_WAIT_SECONDS
    {
        return Err(ConfigError::Validation(format!(
            "backoff must satisfy 0 <= base ({}) <= max ({}) <= {}",
            config.backoff_base_seconds, config.backoff_max_seconds, MAX_WAIT_SECONDS
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_summarizer_config(config: &SummarizerConfig) -> Result<(), ConfigError> {
    if config.sentence_count < 1 {
        return Err(ConfigError::Validation(
            "sentence_count must be >= 1".to_string(),
        ));
    }

    if config.chunk_size < 200 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 200 characters, got {}",
            config.chunk_size
        )));
    }

    if let Some(endpoint) = &config.generation_backend_endpoint {
        let url = Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid generation_backend_endpoint: {}", e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "generation_backend_endpoint must be http(s), got '{}'",
                endpoint
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
