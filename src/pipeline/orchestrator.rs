//! Pipeline orchestrator - drives every seed URL through its stages
//!
//! Each URL moves along `none -> fetched -> parsed -> summarized`. A stage
//! runs when the URL is behind it or its force flag is set. Success records
//! the stage only after its output is stored; failure records the error and
//! stops that URL for the rest of the run. After every URL has finished, the
//! summarized ones are merged into the slug-keyed dataset in seed order.

use crate::config::Config;
use crate::crawler::{build_http_client, Fetcher, PolitenessGate};
use crate::extract::extract;
use crate::pipeline::slug::{base_slug, SlugRegistry};
use crate::pipeline::Listing;
use crate::state::{PipelineStage, PipelineState};
use crate::storage::{self, SharedStorage, Storage, StorageResult};
use crate::summarize::{relevant_text, Summarizer};
use crate::url::{document_key, normalize_url};
use crate::{ErrorKind, ScraperError};
use chrono::Utc;
use futures::future::join_all;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Counts from one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub parsed: usize,
    pub summarized: usize,
    /// URLs with every stage already done
    pub skipped: usize,
    pub failed: usize,
    pub merged: usize,
}

#[derive(Debug, Default)]
struct UrlOutcome {
    fetched: bool,
    parsed: bool,
    summarized: bool,
    failed: bool,
}

impl UrlOutcome {
    fn touched(&self) -> bool {
        self.fetched || self.parsed || self.summarized || self.failed
    }
}

/// Sole writer of the pipeline ledger and the merged dataset
pub struct Orchestrator {
    config: Config,
    storage: SharedStorage,
    fetcher: Fetcher,
    summarizer: Summarizer,
}

impl Orchestrator {
    pub fn new(config: Config, storage: SharedStorage) -> Result<Self, ScraperError> {
        let client = build_http_client(&config.crawler)?;
        let gate = Arc::new(PolitenessGate::new(client.clone(), &config.crawler));
        let fetcher = Fetcher::new(client, gate, &config.crawler, storage.clone());
        let summarizer = Summarizer::new(&config.summarizer);

        Ok(Self {
            config,
            storage,
            fetcher,
            summarizer,
        })
    }

    /// Replaces the summarizer built from config
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn gate(&self) -> &Arc<PolitenessGate> {
        self.fetcher.gate()
    }

    /// Runs every seed through the pipeline and merges the results
    pub async fn run(&self, seeds: &[String]) -> Result<RunReport, ScraperError> {
        let urls = self.prepare_seeds(seeds);
        let flags = self.config.pipeline;
        info!(
            "Processing {} URLs (concurrency {}, force fetch={} parse={} summarize={})",
            urls.len(),
            self.config.crawler.concurrency,
            flags.force_fetch,
            flags.force_parse,
            flags.force_summarize
        );

        let semaphore = Semaphore::new(self.config.crawler.concurrency.max(1));
        let outcomes = join_all(urls.iter().map(|url| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return UrlOutcome::default();
                };
                self.process_url(url).await
            }
        }))
        .await;

        let mut report = RunReport::default();
        let mut processed = HashSet::new();
        for (url, outcome) in urls.iter().zip(&outcomes) {
            report.fetched += outcome.fetched as usize;
            report.parsed += outcome.parsed as usize;
            report.summarized += outcome.summarized as usize;
            report.failed += outcome.failed as usize;
            if outcome.touched() {
                processed.insert(url.as_str());
            } else {
                report.skipped += 1;
            }
        }

        report.merged = self.merge(&urls, &processed)?;

        info!(
            "Run finished: {} fetched, {} parsed, {} summarized, {} skipped, {} failed, {} merged",
            report.fetched,
            report.parsed,
            report.summarized,
            report.skipped,
            report.failed,
            report.merged
        );
        Ok(report)
    }

    /// Every ledger row, ordered by URL
    pub fn status(&self) -> StorageResult<Vec<PipelineState>> {
        storage::lock(&self.storage).all_states()
    }

    pub fn listings(&self) -> StorageResult<BTreeMap<String, Listing>> {
        storage::lock(&self.storage).load_listings()
    }

    /// Applies max_urls, normalizes, and drops duplicates keeping order
    fn prepare_seeds(&self, seeds: &[String]) -> Vec<String> {
        let limit = match self.config.crawler.max_urls {
            0 => seeds.len(),
            n => n,
        };

        let mut seen = HashSet::new();
        seeds
            .iter()
            .take(limit)
            .filter_map(|seed| match normalize_url(seed) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    warn!("Skipping seed {}: {}", seed, e);
                    None
                }
            })
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    async fn process_url(&self, url: &str) -> UrlOutcome {
        match self.advance(url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Storage failure while processing {}: {}", url, e);
                UrlOutcome {
                    failed: true,
                    ..Default::default()
                }
            }
        }
    }

    async fn advance(&self, url: &str) -> StorageResult<UrlOutcome> {
        let flags = self.config.pipeline;
        let mut outcome = UrlOutcome::default();
        let mut state = storage::lock(&self.storage)
            .get_state(url)?
            .unwrap_or_else(|| PipelineState::new(url));

        // Fetch
        if flags.force_fetch || state.stage_completed.is_behind(PipelineStage::Fetched) {
            state.last_attempt = Some(Utc::now().to_rfc3339());
            match self.fetcher.fetch(url).await {
                Ok(doc) => {
                    self.record_success(&mut state, PipelineStage::Fetched, serde_json::to_value(&doc)?)?;
                    outcome.fetched = true;
                }
                Err(e) => {
                    self.record_failure(&mut state, "fetch", e.kind(), e.to_string())?;
                    outcome.failed = true;
                    return Ok(outcome);
                }
            }
        }

        // Parse
        if flags.force_parse || state.stage_completed.is_behind(PipelineStage::Parsed) {
            state.last_attempt = Some(Utc::now().to_rfc3339());
            let raw = storage::lock(&self.storage).get_raw_document(&document_key(url))?;
            let Some(doc) = raw else {
                state.stage_completed = PipelineStage::None;
                self.record_failure(&mut state, "parse", ErrorKind::Internal, "raw document missing".to_string())?;
                outcome.failed = true;
                return Ok(outcome);
            };

            let record = extract(&doc);
            if record.is_degraded() {
                debug!("{}: {} extraction notes", url, record.parse_notes.len());
            }
            let payload = serde_json::to_value(&record)?;
            mark_completed(&mut state, PipelineStage::Parsed);
            storage::lock(&self.storage).commit_extraction(&state, &record, &payload)?;
            info!("{} -> {}", url, state.stage_completed);
            outcome.parsed = true;
        }

        // Summarize
        if flags.force_summarize || state.stage_completed.is_behind(PipelineStage::Summarized) {
            state.last_attempt = Some(Utc::now().to_rfc3339());
            let stored = storage::lock(&self.storage).get_extracted(url)?;
            let Some(stored) = stored else {
                state.stage_completed = PipelineStage::Fetched;
                self.record_failure(&mut state, "summarize", ErrorKind::Internal, "extracted record missing".to_string())?;
                outcome.failed = true;
                return Ok(outcome);
            };

            let record = &stored.record;
            let titles: Vec<&str> = [record.show_title.as_deref(), record.toyline_name.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            let focus = relevant_text(&record.raw_text_for_summary, &titles, self.summarizer.chunk_size());
            let summary = self
                .summarizer
                .summarize_detailed(&focus, self.config.summarizer.sentence_count)
                .await;

            let mut payload = json!({
                "summary": summary.text,
                "strategy": summary.strategy,
            });
            if let Some(reason) = &summary.fallback_reason {
                payload["error_kind"] = json!(ErrorKind::SummarizationBackendUnavailable.to_db_string());
                payload["fallback_reason"] = json!(reason);
            }
            mark_completed(&mut state, PipelineStage::Summarized);
            storage::lock(&self.storage).commit_summary(&state, &summary.text, &payload)?;
            info!("{} -> {}", url, state.stage_completed);
            outcome.summarized = true;
        }

        Ok(outcome)
    }

    fn record_success(
        &self,
        state: &mut PipelineState,
        stage: PipelineStage,
        payload: serde_json::Value,
    ) -> StorageResult<()> {
        mark_completed(state, stage);

        let mut storage = storage::lock(&self.storage);
        storage.put_state(state)?;
        storage.append_record_log(&state.url, stage.to_db_string(), &payload)?;
        info!("{} -> {}", state.url, stage);
        Ok(())
    }

    fn record_failure(
        &self,
        state: &mut PipelineState,
        step: &str,
        kind: ErrorKind,
        message: String,
    ) -> StorageResult<()> {
        warn!("{} failed to {} ({}): {}", state.url, step, kind, message);
        let payload = json!({
            "step": step,
            "error_kind": kind.to_db_string(),
            "error": message,
        });
        state.last_error = Some(message);
        state.error_kind = Some(kind);

        let mut storage = storage::lock(&self.storage);
        storage.put_state(state)?;
        storage.append_record_log(&state.url, "failed", &payload)?;
        Ok(())
    }

    /// Writes a listing for every summarized URL, in seed order
    fn merge(&self, urls: &[String], processed: &HashSet<&str>) -> StorageResult<usize> {
        let mut storage = storage::lock(&self.storage);
        let existing = storage.load_listings()?;
        let mut registry = SlugRegistry::from_listings(&existing);
        let now = Utc::now();
        let mut merged = 0;

        for url in urls {
            let summarized = storage
                .get_state(url)?
                .is_some_and(|s| s.stage_completed == PipelineStage::Summarized);
            if !summarized {
                continue;
            }
            let Some(stored) = storage.get_extracted(url)? else {
                warn!("{} is summarized but has no stored record", url);
                continue;
            };

            let base = base_slug(&stored.record);
            let assignment = registry.assign(&base, &stored.record.source_url);
            if assignment.collided {
                info!(
                    "Slug {} taken, {} merged as {} ({})",
                    base,
                    url,
                    assignment.slug,
                    ErrorKind::SlugCollision
                );
            }

            let first_seen = existing
                .get(&assignment.slug)
                .map(|listing| listing.first_seen)
                .unwrap_or(now);
            let listing = Listing {
                slug: assignment.slug,
                record: stored.record,
                description_summary: stored.summary.unwrap_or_default(),
                first_seen,
            };
            storage.put_listing(&listing)?;

            if processed.contains(url.as_str()) {
                storage.append_record_log(
                    url,
                    "merged",
                    &json!({ "slug": listing.slug, "slug_collision": assignment.collided }),
                )?;
            }
            merged += 1;
        }

        debug!("Merged {} listings", merged);
        Ok(merged)
    }
}

/// Moves `state` to `stage` and clears the last error
fn mark_completed(state: &mut PipelineState, stage: PipelineStage) {
    state.stage_completed = stage;
    state.last_error = None;
    state.error_kind = None;
}
