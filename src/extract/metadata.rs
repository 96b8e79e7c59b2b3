//! Declared page metadata: title tag, meta tags, canonical link, JSON-LD
//!
//! Metadata is read before any text heuristics run; the rule chains consult
//! it first.

use crate::extract::text::clean_text;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Meta tags kept from the document head, keyed by name or property
const META_KEYS: &[&str] = &[
    "description",
    "keywords",
    "og:title",
    "og:type",
    "og:description",
    "og:image",
];

/// Metadata declared by a page
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    /// Text of the first `<title>`
    pub title: Option<String>,

    /// Text of the first `<h1>`
    pub h1: Option<String>,

    /// Selected meta tags plus `canonical`, keyed by lowercase name
    pub tags: HashMap<String, String>,

    /// JSON-LD objects, with arrays and `@graph` flattened
    pub json_ld: Vec<Map<String, Value>>,
}

impl PageMeta {
    pub fn from_document(document: &Html) -> Self {
        Self {
            title: first_text(document, "title"),
            h1: first_text(document, "h1"),
            tags: extract_tags(document),
            json_ld: extract_json_ld(document),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// First JSON-LD value for `key` among objects whose `@type` is one of `types`
    ///
    /// An empty `types` slice matches every object. Values that are objects
    /// yield their `name`; arrays yield their first usable element.
    pub fn ld_value(&self, types: &[&str], key: &str) -> Option<String> {
        self.json_ld
            .iter()
            .filter(|obj| types.is_empty() || has_type(obj, types))
            .find_map(|obj| obj.get(key).and_then(ld_text))
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_tags(document: &Html) -> HashMap<String, String> {
    let mut tags = HashMap::new();

    if let Ok(selector) = Selector::parse("meta[content]") {
        for element in document.select(&selector) {
            let attrs = element.value();
            let Some(key) = attrs.attr("property").or_else(|| attrs.attr("name")) else {
                continue;
            };
            let key = key.trim().to_lowercase();
            if !META_KEYS.contains(&key.as_str()) || tags.contains_key(&key) {
                continue;
            }
            let content = clean_text(attrs.attr("content").unwrap_or_default());
            if !content.is_empty() {
                tags.insert(key, content);
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel='canonical'][href]") {
        if let Some(href) = document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("href"))
        {
            tags.insert("canonical".to_string(), href.trim().to_string());
        }
    }

    tags
}

fn extract_json_ld(document: &Html) -> Vec<Map<String, Value>> {
    let mut objects = Vec::new();

    if let Ok(selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&selector) {
            let json_text = script.text().collect::<String>();
            match serde_json::from_str::<Value>(json_text.trim()) {
                Ok(value) => flatten_json_ld(value, &mut objects),
                Err(e) => tracing::debug!("Skipping unparsable JSON-LD block: {}", e),
            }
        }
    }

    objects
}

fn flatten_json_ld(value: Value, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            if !map.is_empty() {
                out.push(map);
            }
        }
        _ => {}
    }
}

fn has_type(obj: &Map<String, Value>, types: &[&str]) -> bool {
    let matches = |t: &str| types.iter().any(|want| want.eq_ignore_ascii_case(t));
    match obj.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

/// Readable text of a JSON-LD value
pub fn ld_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(clean_text(s)).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("name").and_then(ld_text),
        Value::Array(items) => items.iter().find_map(ld_text),
        _ => None,
    }
}
