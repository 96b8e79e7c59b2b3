//! Pipeline orchestration: per-URL stage machine and the listing merge
//!
//! # Example
//!
//! ```no_run
//! use toytoons_scraper::config::{load_config, load_seeds};
//! use toytoons_scraper::storage::open_shared;
//! use toytoons_scraper::Orchestrator;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(Path::new("toytoons.toml"))?;
//! let seeds = load_seeds(Path::new(&config.seeds_path))?;
//! let storage = open_shared(Path::new(&config.output.database_path))?;
//! let report = Orchestrator::new(config, storage)?.run(&seeds).await?;
//! println!("{} listings merged", report.merged);
//! # Ok(())
//! # }
//! ```

mod listing;
mod orchestrator;
mod slug;

pub use listing::Listing;
pub use orchestrator::{Orchestrator, RunReport};
pub use slug::{base_slug, slugify, SlugAssignment, SlugRegistry, MAX_SLUG_LEN};
