//! Boilerplate removal: pick the densest content block and read its text
//!
//! Each candidate block is scored as
//! `text_len * (1 - link_density) + 25 * paragraphs + commas`,
//! then boosted for content-like tags and names and penalized for
//! navigation-like names.

use crate::extract::text::clean_text;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as content
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside", "form", "iframe", "svg",
];

/// Elements that end a run of text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "br", "h1", "h2", "h3", "h4", "h5", "h6", "td", "th", "tr", "table", "ul",
    "ol", "section", "article", "main", "blockquote", "pre", "dd", "dt", "figcaption",
];

const POSITIVE_HINTS: &[&str] = &["content", "article", "body", "main", "entry", "post", "text"];

const NEGATIVE_HINTS: &[&str] = &[
    "nav", "footer", "sidebar", "comment", "menu", "header", "widget", "advert", "share", "related",
    "promo", "cookie",
];

/// Blocks with less visible text than this are not candidates
const MIN_BLOCK_CHARS: usize = 25;

/// Visible text below `element`, skipping non-content subtrees
pub fn visible_text(element: ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    clean_text(&out)
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if SKIP_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if BLOCK_TAGS.contains(&el.name()) {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn is_skipped(element: ElementRef) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|el| SKIP_TAGS.contains(&el.name()))
    })
}

/// Score of one candidate block
pub fn score_block(element: ElementRef) -> f64 {
    let text = visible_text(element);
    let text_len = text.chars().count();
    if text_len < MIN_BLOCK_CHARS {
        return 0.0;
    }

    let link_len: usize = match Selector::parse("a") {
        Ok(selector) => element
            .select(&selector)
            .map(|a| visible_text(a).chars().count())
            .sum(),
        Err(_) => 0,
    };
    let link_density = (link_len as f64 / text_len as f64).min(1.0);

    let paragraphs = match Selector::parse("p") {
        Ok(selector) => element.select(&selector).count(),
        Err(_) => 0,
    };
    let commas = text.matches(',').count();

    let mut score = text_len as f64 * (1.0 - link_density) + 25.0 * paragraphs as f64 + commas as f64;

    let el = element.value();
    let hints = format!(
        "{} {}",
        el.attr("class").unwrap_or_default(),
        el.attr("id").unwrap_or_default()
    )
    .to_lowercase();

    if matches!(el.name(), "article" | "main") || POSITIVE_HINTS.iter().any(|h| hints.contains(h)) {
        score *= 1.25;
    }
    if NEGATIVE_HINTS.iter().any(|h| hints.contains(h)) {
        score *= 0.5;
    }

    score
}

/// The highest-scoring content block, if any block qualifies
///
/// Ties go to the later block in document order, which is the innermost
/// of a set of nested wrappers holding the same text.
pub fn main_content(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("article, main, section, div, td").ok()?;

    let mut best: Option<(f64, ElementRef)> = None;
    for element in document.select(&selector) {
        if is_skipped(element) {
            continue;
        }
        let score = score_block(element);
        if score <= 0.0 {
            continue;
        }
        if best.as_ref().map_or(true, |(top, _)| score >= *top) {
            best = Some((score, element));
        }
    }

    best.map(|(_, element)| element)
}

/// Readable text of a content region
///
/// Paragraph-level children are joined by blank lines. A region without any
/// falls back to its whole visible text.
pub fn region_text(region: ElementRef) -> String {
    let Ok(blocks) = Selector::parse("p, li, h2, h3, h4, blockquote") else {
        return visible_text(region);
    };
    let Ok(paragraph) = Selector::parse("p") else {
        return visible_text(region);
    };

    let parts: Vec<String> = region
        .select(&blocks)
        .filter(|el| !is_skipped(*el))
        // A list item or quote wrapping <p> is read through its paragraphs
        .filter(|el| el.value().name() == "p" || el.select(&paragraph).next().is_none())
        .map(visible_text)
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        visible_text(region)
    } else {
        parts.join("\n\n")
    }
}

/// Readable text of a whole document
///
/// Uses the main content block when one exists, else the `<body>` text.
pub fn readable_text(document: &Html) -> String {
    if let Some(region) = main_content(document) {
        return region_text(region);
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    match body {
        Some(body) => visible_text(body),
        None => visible_text(document.root_element()),
    }
}
