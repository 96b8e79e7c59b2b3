//! Notable character heuristic over readable text

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Most characters kept per record
pub const MAX_CHARACTERS: usize = 8;

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[\s-]+[A-Z][a-z]+)*\b").expect("capitalized run pattern should compile")
});

static CUE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:characters?|featur(?:e|es|ed|ing)|starr(?:ed|ing)|voiced|heroe?s?|villains?|leaders?)\b")
        .expect("cue word pattern should compile")
});

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?]+\s+").expect("sentence end pattern should compile")
});

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "The", "And", "Or", "But", "In", "On", "At", "To", "For", "Of", "With", "By", "From", "Up",
        "About", "Into", "Through", "During", "Before", "After", "Above", "Below", "Between",
        "Among", "This", "That", "These", "Those", "He", "She", "It", "They", "We", "You", "His",
        "Her", "Its", "Their", "Our", "Your", "When", "While", "Where", "Which", "Who", "What",
        "There", "Here", "Each", "Some", "Many", "Most", "Also", "However", "Although", "As",
        "An", "Episode", "Episodes", "Season", "Seasons", "Series", "Show", "Character",
        "Characters", "Story", "Plot", "Cartoon", "Toy", "Toys", "Television", "Network",
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December", "Monday", "Tuesday", "Wednesday", "Thursday",
        "Friday", "Saturday", "Sunday", "Starring", "Featuring", "Featured", "Voiced", "Hero",
        "Heroes", "Villain", "Villains", "Leader", "Produced", "Created", "Released", "Aired",
        "American", "Japanese", "Canadian", "British", "French",
    ]
    .into_iter()
    .collect()
});

/// Extracts likely character names, in order of first appearance
///
/// Sentences with cue words ("featuring", "villain", ...) are scanned before
/// the rest of the text. Names equal to one of `exclude` (the record's own
/// titles) are dropped, and so are stop words and tokens of two characters
/// or fewer. Deduplication ignores case.
pub fn extract_characters(text: &str, exclude: &[&str]) -> Vec<String> {
    let sentences: Vec<&str> = SENTENCE_END.split(text).collect();
    let (cued, rest): (Vec<&str>, Vec<&str>) =
        sentences.into_iter().partition(|s| CUE_WORDS.is_match(s));

    let excluded: HashSet<String> = exclude.iter().map(|t| t.to_lowercase()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut characters = Vec::new();

    for sentence in cued.into_iter().chain(rest) {
        for m in CAPITALIZED_RUN.find_iter(sentence) {
            let Some(name) = trim_stop_words(m.as_str()) else {
                continue;
            };
            let key = name.to_lowercase();
            if name.len() <= 2 || excluded.contains(&key) || !seen.insert(key) {
                continue;
            }
            characters.push(name);
            if characters.len() >= MAX_CHARACTERS {
                return characters;
            }
        }
    }

    characters
}

/// Drops leading and trailing stop words from a capitalized run
fn trim_stop_words(run: &str) -> Option<String> {
    let words: Vec<&str> = run.split_whitespace().collect();
    let start = words.iter().position(|w| !STOP_WORDS.contains(w))?;
    let end = words.iter().rposition(|w| !STOP_WORDS.contains(w))?;
    Some(words[start..=end].join(" "))
}
