//! Text cleanup helpers shared by the extraction rules

use regex::Regex;
use std::sync::LazyLock;

static SITE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+[-|•–—]\s+.*$").expect("site suffix pattern should compile")
});

static DISAMBIGUATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\((?:\d{4}\s+)?(?:tv|television|animated)?\s*(?:series|show|franchise|toy ?line|cartoon)\)\s*$")
        .expect("disambiguator pattern should compile")
});

/// Collapses runs of whitespace into single spaces and trims
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces en and em dashes with `-`
pub fn normalize_dashes(text: &str) -> String {
    text.replace(['\u{2013}', '\u{2014}'], "-")
}

/// Cuts `text` to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Cleans a candidate title
///
/// Strips a trailing `" - Site"` style suffix and a parenthetical such as
/// "(TV series)". Returns None unless more than 3 characters remain; the
/// result is cut to 200 characters.
pub fn clean_title(raw: &str) -> Option<String> {
    let text = clean_text(raw);
    let text = SITE_SUFFIX.replace(&text, "");
    let text = DISAMBIGUATOR.replace(&text, "");
    let text = text.trim();
    if text.chars().count() > 3 {
        Some(truncate_chars(text, 200))
    } else {
        None
    }
}
