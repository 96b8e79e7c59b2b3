//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus reading the seed list.
//!
//! # Example
//!
//! ```no_run
//! use toytoons_scraper::config::{load_config, load_seeds};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("toytoons.toml")).unwrap();
//! let seeds = load_seeds(Path::new(&config.seeds_path)).unwrap();
//! println!("{} seeds, concurrency {}", seeds.len(), config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, PipelineFlags, SummarizerConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_seeds};
pub use validation::validate;
