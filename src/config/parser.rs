use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use url::Url;

/// Loads and parses a configuration file from the given path
///
/// Missing keys take their defaults, so an empty file is a valid
/// configuration.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use toytoons_scraper::config::load_config;
///
/// let config = load_config(Path::new("toytoons.toml")).unwrap();
/// println!("Concurrency: {}", config.crawler.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads a seed list: one URL per line, blank and `#` lines ignored
///
/// Lines that are not http(s) URLs are skipped with a warning rather than
/// failing the whole list.
pub fn load_seeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_seeds(&content))
}

pub(crate) fn parse_seeds(content: &str) -> Vec<String> {
    let mut seeds = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Url::parse(line) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => seeds.push(line.to_string()),
            _ => tracing::warn!("Skipping seed on line {}: not an http(s) URL: {}", index + 1, line),
        }
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_file(
            r#"
seeds-path = "my-seeds.txt"

[crawler]
max-urls = 25
delay-min = 0.5
delay-max = 1.5
concurrency = 4
max-retries = 2

[summarizer]
sentence-count = 3
generation-backend-endpoint = "http://localhost:11434"

[pipeline]
force-parse = true

[output]
database-path = "./test.db"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.seeds_path, "my-seeds.txt");
        assert_eq!(config.crawler.max_urls, 25);
        assert_eq!(config.crawler.concurrency, 4);
        assert_eq!(config.crawler.max_retries, 2);
        // Untouched keys keep their defaults
        assert_eq!(config.crawler.request_timeout_seconds, 30);
        assert_eq!(config.summarizer.sentence_count, 3);
        assert!(config.pipeline.force_parse);
        assert!(!config.pipeline.force_fetch);
        assert_eq!(config.output.database_path, "./test.db");
        assert_eq!(config.output.dataset_path, "listings.json");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_file("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawler.delay_min, 0.8);
        assert_eq!(config.crawler.delay_max, 2.0);
        assert_eq!(config.crawler.concurrency, 2);
        assert_eq!(config.summarizer.sentence_count, 2);
        assert!(config.summarizer.generation_backend_endpoint.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_file("this is not valid TOML {{{");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_file("[crawler]\ndelay-min = 3.0\ndelay-max = 1.0\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_compute_config_hash() {
        let file1 = create_temp_file("content 1");
        let file2 = create_temp_file("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        assert_eq!(hash1, compute_config_hash(file1.path()).unwrap());
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, compute_config_hash(file2.path()).unwrap());
    }

    #[test]
    fn test_parse_seeds_skips_comments_and_blanks() {
        let seeds = parse_seeds(
            "# cartoons\n\nhttps://example.com/a\n   \n  https://example.com/b  \n#https://skipped.com\n",
        );
        assert_eq!(seeds, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn test_parse_seeds_skips_non_http() {
        let seeds = parse_seeds("ftp://example.com/file\nnot a url\nhttp://ok.example/\n");
        assert_eq!(seeds, vec!["http://ok.example/"]);
    }

    #[test]
    fn test_load_seeds_from_file() {
        let file = create_temp_file("https://example.com/1\n# comment\nhttps://example.com/2\n");
        let seeds = load_seeds(file.path()).unwrap();
        assert_eq!(seeds.len(), 2);
    }
}
