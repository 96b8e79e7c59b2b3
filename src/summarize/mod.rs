//! Summarization with a model backend and an extractive fallback
//!
//! The strategy is chosen per call: the model backend is used when one is
//! configured and its liveness probe succeeds, and any failure after that
//! falls through to TextRank. `Summarizer::summarize` therefore always
//! returns text and never an error.

mod backend;
mod textrank;

pub use backend::{chunk_text, clean_response, ModelBackend, SummarizeError};
pub use textrank::{similarity, split_sentences, tokens, TextRank};

use crate::config::SummarizerConfig;
use async_trait::async_trait;
use tracing::{debug, warn};

/// One way of producing a summary
#[async_trait]
pub trait SummaryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the strategy can be used right now
    async fn is_live(&self) -> bool {
        true
    }

    async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String, SummarizeError>;
}

#[async_trait]
impl SummaryStrategy for ModelBackend {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn is_live(&self) -> bool {
        ModelBackend::is_live(self).await
    }

    async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String, SummarizeError> {
        ModelBackend::summarize(self, text, max_sentences).await
    }
}

#[async_trait]
impl SummaryStrategy for TextRank {
    fn name(&self) -> &'static str {
        "textrank"
    }

    async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String, SummarizeError> {
        Ok(TextRank::summarize(self, text, max_sentences))
    }
}

/// A produced summary and how it was made
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    pub strategy: &'static str,
    /// Set when a configured backend was skipped or failed
    pub fallback_reason: Option<String>,
}

pub struct Summarizer {
    primary: Option<Box<dyn SummaryStrategy>>,
    fallback: TextRank,
    chunk_size: usize,
}

impl Summarizer {
    /// Builds a summarizer from config; no endpoint means TextRank only
    pub fn new(config: &SummarizerConfig) -> Self {
        let primary = config
            .generation_backend_endpoint
            .as_deref()
            .and_then(|endpoint| match ModelBackend::new(config, endpoint) {
                Ok(backend) => Some(Box::new(backend) as Box<dyn SummaryStrategy>),
                Err(e) => {
                    warn!("Cannot build model backend for {}: {}", endpoint, e);
                    None
                }
            });

        Self {
            primary,
            fallback: TextRank::default(),
            chunk_size: config.chunk_size.max(1),
        }
    }

    pub fn fallback_only() -> Self {
        Self {
            primary: None,
            fallback: TextRank::default(),
            chunk_size: SummarizerConfig::default().chunk_size,
        }
    }

    pub fn with_strategy(strategy: Box<dyn SummaryStrategy>, chunk_size: usize) -> Self {
        Self {
            primary: Some(strategy),
            fallback: TextRank::default(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub async fn summarize(&self, text: &str, max_sentences: usize) -> String {
        self.summarize_detailed(text, max_sentences).await.text
    }

    /// Summarizes and reports which strategy produced the text
    pub async fn summarize_detailed(&self, text: &str, max_sentences: usize) -> Summary {
        let mut fallback_reason = None;

        if text.trim().is_empty() {
            return Summary {
                text: String::new(),
                strategy: self.fallback.name(),
                fallback_reason,
            };
        }

        if let Some(primary) = &self.primary {
            if primary.is_live().await {
                match primary.summarize(text, max_sentences).await {
                    Ok(summary) => {
                        debug!("Summarized {} chars with {}", text.len(), primary.name());
                        return Summary {
                            text: summary,
                            strategy: primary.name(),
                            fallback_reason,
                        };
                    }
                    Err(e) => {
                        warn!("Summarization backend failed, using TextRank: {}", e);
                        fallback_reason = Some(e.to_string());
                    }
                }
            } else {
                warn!("Summarization backend not reachable, using TextRank");
                fallback_reason = Some("backend not reachable".to_string());
            }
        }

        Summary {
            text: self.fallback.summarize(text, max_sentences),
            strategy: self.fallback.name(),
            fallback_reason,
        }
    }
}

/// Keeps the paragraphs that mention one of `terms`
///
/// Matching ignores case. With no matching paragraph (or no terms) the
/// whole text is kept. The result is cut to `3 * chunk_size` characters.
pub fn relevant_text(text: &str, terms: &[&str], chunk_size: usize) -> String {
    let terms: Vec<String> = terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let focused: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let lower = p.to_lowercase();
            terms.iter().any(|t| lower.contains(t.as_str()))
        })
        .collect();

    let selected = if focused.is_empty() {
        text.trim().to_string()
    } else {
        focused.join("\n\n")
    };

    let limit = chunk_size.saturating_mul(3);
    match selected.char_indices().nth(limit) {
        Some((cut, _)) => selected[..cut].to_string(),
        None => selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Failing {
        live: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SummaryStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn is_live(&self) -> bool {
            self.live
        }

        async fn summarize(&self, _text: &str, _n: usize) -> Result<String, SummarizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SummarizeError::Timeout)
        }
    }

    struct Canned;

    #[async_trait]
    impl SummaryStrategy for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn summarize(&self, _text: &str, _n: usize) -> Result<String, SummarizeError> {
            Ok("Canned summary.".to_string())
        }
    }

    const TEXT: &str = "Jem is a singer. Jem leads the Holograms. The Misfits rival Jem. It rained.";

    #[tokio::test]
    async fn test_fallback_only_matches_textrank() {
        let summarizer = Summarizer::fallback_only();
        let summary = summarizer.summarize_detailed(TEXT, 2).await;
        assert_eq!(summary.text, TextRank::default().summarize(TEXT, 2));
        assert_eq!(summary.strategy, "textrank");
        assert_eq!(summary.fallback_reason, None);
    }

    #[tokio::test]
    async fn test_no_endpoint_means_fallback() {
        let summarizer = Summarizer::new(&SummarizerConfig::default());
        assert_eq!(summarizer.summarize(TEXT, 2).await, TextRank::default().summarize(TEXT, 2));
    }

    #[tokio::test]
    async fn test_backend_error_falls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let summarizer = Summarizer::with_strategy(
            Box::new(Failing { live: true, calls: calls.clone() }),
            4000,
        );
        let summary = summarizer.summarize_detailed(TEXT, 1).await;
        assert_eq!(summary.strategy, "textrank");
        assert_eq!(summary.fallback_reason.as_deref(), Some("backend timed out"));
        assert!(!summary.text.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dead_backend_is_not_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let summarizer = Summarizer::with_strategy(
            Box::new(Failing { live: false, calls: calls.clone() }),
            4000,
        );
        let summary = summarizer.summarize_detailed(TEXT, 1).await;
        assert_eq!(summary.strategy, "textrank");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_backend_wins() {
        let summarizer = Summarizer::with_strategy(Box::new(Canned), 4000);
        let summary = summarizer.summarize_detailed(TEXT, 2).await;
        assert_eq!(summary.text, "Canned summary.");
        assert_eq!(summary.strategy, "canned");
    }

    #[tokio::test]
    async fn test_empty_text_skips_backend() {
        let summarizer = Summarizer::with_strategy(Box::new(Canned), 4000);
        assert_eq!(summarizer.summarize("  ", 2).await, "");
    }

    #[test]
    fn test_relevant_text() {
        let text = "Intro about the site.\n\nThunderCats aired in 1985.\n\nUnrelated.\n\nThe thundercats toys sold well.";
        assert_eq!(
            relevant_text(text, &["ThunderCats"], 4000),
            "ThunderCats aired in 1985.\n\nThe thundercats toys sold well."
        );
        assert_eq!(relevant_text(text, &["Jem"], 4000), text);
        assert_eq!(relevant_text(text, &[], 4000), text);
    }

    #[test]
    fn test_relevant_text_is_capped() {
        let text = "x".repeat(100);
        assert_eq!(relevant_text(&text, &[], 10).len(), 30);
    }
}
