//! Deterministic extractive summarization (TextRank)
//!
//! Sentences are graph nodes, edge weights are normalized token overlap, and
//! scores come from PageRank-style power iteration. The top sentences are
//! re-emitted in document order. No randomness is involved: equal input
//! always gives byte-identical output.

use std::collections::HashSet;

const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];

/// Splits text into sentences
///
/// A sentence ends after `.`, `!` or `?` (plus any closing quotes or
/// brackets) when followed by whitespace or the end of the text. A blank
/// line also ends a sentence. Returned sentences are trimmed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (_, c) = chars[i];
        let mut end = None;

        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && (matches!(chars[j].1, '.' | '!' | '?') || CLOSERS.contains(&chars[j].1)) {
                j += 1;
            }
            if j == chars.len() || chars[j].1.is_whitespace() {
                end = Some(j);
            }
        } else if c == '\n' && i + 1 < chars.len() && chars[i + 1].1 == '\n' {
            end = Some(i);
        }

        match end {
            Some(j) => {
                let byte_end = chars.get(j).map_or(text.len(), |(b, _)| *b);
                push_trimmed(&mut sentences, &text[start..byte_end]);
                start = byte_end;
                i = j.max(i + 1);
            }
            None => i += 1,
        }
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

/// Distinct lowercase alphanumeric words of a sentence
pub fn tokens(sentence: &str) -> HashSet<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Normalized overlap: shared tokens over `ln(1+|a|) + ln(1+|b|)`
pub fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    if shared == 0 {
        return 0.0;
    }
    shared as f64 / ((1.0 + a.len() as f64).ln() + (1.0 + b.len() as f64).ln())
}

/// TextRank parameters
#[derive(Debug, Clone)]
pub struct TextRank {
    pub damping: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for TextRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            epsilon: 1e-6,
            max_iterations: 100,
        }
    }
}

impl TextRank {
    /// Centrality score of each sentence, in input order
    pub fn rank(&self, sentences: &[String]) -> Vec<f64> {
        let n = sentences.len();
        let token_sets: Vec<HashSet<String>> = sentences.iter().map(|s| tokens(s)).collect();

        let mut weights = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let w = similarity(&token_sets[i], &token_sets[j]);
                weights[i][j] = w;
                weights[j][i] = w;
            }
        }
        let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();

        let mut scores = vec![1.0; n];
        for _ in 0..self.max_iterations {
            let mut next = vec![1.0 - self.damping; n];
            for (i, slot) in next.iter_mut().enumerate() {
                let incoming: f64 = (0..n)
                    .filter(|&j| j != i && out_weight[j] > 0.0)
                    .map(|j| weights[j][i] / out_weight[j] * scores[j])
                    .sum();
                *slot += self.damping * incoming;
            }

            let delta = next
                .iter()
                .zip(&scores)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            scores = next;
            if delta < self.epsilon {
                break;
            }
        }

        scores
    }

    /// Picks the `max_sentences` most central sentences in document order
    ///
    /// Empty text gives an empty string; text with no more sentences than
    /// requested comes back verbatim. Equal scores go to the earlier sentence.
    pub fn summarize(&self, text: &str, max_sentences: usize) -> String {
        if text.trim().is_empty() || max_sentences == 0 {
            return String::new();
        }

        let sentences = split_sentences(text);
        if sentences.len() <= max_sentences {
            return text.to_string();
        }

        let scores = self.rank(&sentences);
        let mut order: Vec<usize> = (0..sentences.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let mut chosen: Vec<usize> = order.into_iter().take(max_sentences).collect();
        chosen.sort_unstable();

        chosen
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
