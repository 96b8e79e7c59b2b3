//! Ollama-compatible generation backend

use crate::config::SummarizerConfig;
use crate::summarize::textrank::split_sentences;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const TEMPERATURE: f32 = 0.2;

/// Why a backend attempt did not yield a summary
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend timed out")]
    Timeout,

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for SummarizeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::BackendUnavailable(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

/// Client for a local model server speaking the Ollama HTTP API
pub struct ModelBackend {
    client: Client,
    endpoint: String,
    model: String,
    chunk_size: usize,
}

impl ModelBackend {
    pub fn new(config: &SummarizerConfig, endpoint: &str) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_seconds))
            .build()
            .map_err(|e| SummarizeError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            chunk_size: config.chunk_size.max(1),
        })
    }

    /// Liveness probe against `/api/tags`
    pub async fn is_live(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Backend probe {} failed: {}", url, e);
                false
            }
        }
    }

    /// Summarizes `text` to at most `max_sentences` sentences
    ///
    /// Text longer than the chunk size is summarized chunk by chunk and the
    /// joined partial summaries are reduced once more when still too long.
    pub async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String, SummarizeError> {
        if text.chars().count() <= self.chunk_size {
            return self.generate(text, max_sentences).await;
        }

        let chunks = chunk_text(text, self.chunk_size);
        let per_chunk = (max_sentences / 2).max(1);
        debug!("Summarizing {} chunks at {} sentences each", chunks.len(), per_chunk);

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            partials.push(self.generate(chunk, per_chunk).await?);
        }
        let combined = partials.join(" ");

        if combined.chars().count() > self.chunk_size {
            self.generate(&combined, max_sentences).await
        } else {
            Ok(truncate_sentences(&combined, max_sentences))
        }
    }

    async fn generate(&self, text: &str, max_sentences: usize) -> Result<String, SummarizeError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(text, max_sentences),
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
            },
        };

        let url = format!("{}/api/generate", self.endpoint);
        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SummarizeError::BackendUnavailable(format!("HTTP {}", status)));
        }

        let body: GenerateResponse = resp.json().await?;
        let summary = truncate_sentences(&clean_response(&body.response), max_sentences);
        if summary.is_empty() {
            return Err(SummarizeError::MalformedResponse("empty summary".to_string()));
        }
        Ok(summary)
    }
}

fn build_prompt(text: &str, max_sentences: usize) -> String {
    format!(
        "Summarize the following text about an animated TV show and/or toy line \
         in at most {} sentences. Focus on the key facts about the show and toys. \
         Use only the provided text - do not invent facts.\n\nText:\n{}\n\nSummary:",
        max_sentences, text
    )
}

/// Drops preamble lines ("Summary:", "Here is...") and joins the rest
pub fn clean_response(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Summary:") && !line.starts_with("Here"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_sentences(text: &str, max_sentences: usize) -> String {
    split_sentences(text)
        .into_iter()
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits text at sentence boundaries into chunks of at most `chunk_size`
/// characters; a single sentence longer than that becomes its own chunk
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let needed = current.chars().count() + sentence.chars().count() + 1;
        if !current.is_empty() && needed > chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
