//! Toytoons main entry point
//!
//! This is the command-line interface for the toytoons acquisition pipeline.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use toytoons_scraper::config::{load_config_with_hash, load_seeds, Config};
use toytoons_scraper::output::{export_all, load_status, print_status, JsonExporter};
use toytoons_scraper::storage::{self, open_shared};
use toytoons_scraper::Orchestrator;
use tracing_subscriber::EnvFilter;

/// Toytoons: fetch, extract and summarize cartoon and toy line pages
///
/// Every seed URL is fetched politely, turned into a structured record,
/// summarized, and merged into a slug-keyed listing dataset. Completed
/// stages are skipped on reruns unless a force flag asks for a redo.
#[derive(Parser, Debug)]
#[command(name = "toytoons")]
#[command(version)]
#[command(about = "Polite scraper for 80s/90s cartoon and toy line pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed list to use instead of the configured seeds-path
    #[arg(long, value_name = "FILE")]
    seeds: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Refetch every seed
    #[arg(long)]
    force_fetch: bool,

    /// Re-extract every stored document
    #[arg(long)]
    force_parse: bool,

    /// Re-summarize every stored record
    #[arg(long)]
    force_summarize: bool,

    /// Shorthand for all three force flags
    #[arg(long)]
    force: bool,

    /// Validate config and seeds and show what would be processed
    #[arg(long, conflicts_with_all = ["status", "export"])]
    dry_run: bool,

    /// Show the per-URL pipeline status and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    status: bool,

    /// Export the dataset and record log from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "status"])]
    export: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let flags = &mut config.pipeline;
    flags.force_fetch |= cli.force_fetch || cli.force;
    flags.force_parse |= cli.force_parse || cli.force;
    flags.force_summarize |= cli.force_summarize || cli.force;

    let seeds_path = cli
        .seeds
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.seeds_path));

    if cli.dry_run {
        handle_dry_run(&config, &seeds_path)
    } else if cli.status {
        handle_status(&config)
    } else if cli.export {
        handle_export(&config)
    } else {
        handle_run(config, &seeds_path).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("toytoons_scraper=info,warn"),
            1 => EnvFilter::new("toytoons_scraper=debug,info"),
            2 => EnvFilter::new("toytoons_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn handle_dry_run(config: &Config, seeds_path: &Path) -> anyhow::Result<()> {
    let seeds = load_seeds(seeds_path).with_context(|| format!("reading seeds from {}", seeds_path.display()))?;

    println!("=== Toytoons Dry Run ===\n");

    println!("Crawler:");
    println!("  Max URLs: {}", config.crawler.max_urls);
    println!("  Delay: {:.1}s - {:.1}s", config.crawler.delay_min, config.crawler.delay_max);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Request timeout: {}s", config.crawler.request_timeout_seconds);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nSummarizer:");
    println!("  Sentences: {}", config.summarizer.sentence_count);
    match &config.summarizer.generation_backend_endpoint {
        Some(endpoint) => println!("  Backend: {} (model {})", endpoint, config.summarizer.model),
        None => println!("  Backend: none (TextRank only)"),
    }

    println!("\nForce flags:");
    println!("  fetch={} parse={} summarize={}", config.pipeline.force_fetch, config.pipeline.force_parse, config.pipeline.force_summarize);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Dataset: {}", config.output.dataset_path);
    println!("  Record log: {}", config.output.record_log_path);

    println!("\nSeeds ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

fn handle_status(config: &Config) -> anyhow::Result<()> {
    let shared = open_shared(Path::new(&config.output.database_path))?;
    let guard = storage::lock(&shared);
    let (states, stats) = load_status(&*guard)?;
    print_status(&states, &stats);
    Ok(())
}

fn handle_export(config: &Config) -> anyhow::Result<()> {
    let shared = open_shared(Path::new(&config.output.database_path))?;
    let exporter = JsonExporter::new(&config.output.dataset_path, &config.output.record_log_path);
    export_all(&*storage::lock(&shared), &exporter)?;

    println!("✓ Dataset exported to: {}", config.output.dataset_path);
    println!("✓ Record log exported to: {}", config.output.record_log_path);
    Ok(())
}

async fn handle_run(config: Config, seeds_path: &Path) -> anyhow::Result<()> {
    let seeds = load_seeds(seeds_path).with_context(|| format!("reading seeds from {}", seeds_path.display()))?;
    tracing::info!("Loaded {} seeds from {}", seeds.len(), seeds_path.display());

    let shared = open_shared(Path::new(&config.output.database_path))?;
    let exporter = JsonExporter::new(&config.output.dataset_path, &config.output.record_log_path);

    let orchestrator = Orchestrator::new(config, shared.clone())?;
    let report = orchestrator.run(&seeds).await?;

    export_all(&*storage::lock(&shared), &exporter)?;

    tracing::info!(
        "Done: {} merged, {} failed, {} skipped",
        report.merged,
        report.failed,
        report.skipped
    );
    Ok(())
}
