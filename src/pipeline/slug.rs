//! Slug derivation and collision-free assignment

use crate::extract::ExtractedRecord;
use crate::pipeline::Listing;
use std::collections::{BTreeMap, HashMap};
use url::Url;

pub const MAX_SLUG_LEN: usize = 100;

/// Lowercases and collapses every non-alphanumeric run into one `-`
///
/// May return an empty string when the input has no alphanumerics.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    match slug.char_indices().nth(MAX_SLUG_LEN) {
        Some((cut, _)) => slug[..cut].trim_end_matches('-').to_string(),
        None => slug,
    }
}

/// Base slug for a record: its title, else the source host, else "listing"
pub fn base_slug(record: &ExtractedRecord) -> String {
    let from_title = record.display_title().map(slugify).unwrap_or_default();
    if !from_title.is_empty() {
        return from_title;
    }

    let from_host = Url::parse(&record.source_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| slugify(&h.replace('.', "-"))))
        .unwrap_or_default();
    if !from_host.is_empty() {
        return from_host;
    }

    "listing".to_string()
}

/// Result of placing one source URL in the slug namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugAssignment {
    pub slug: String,
    /// True when the base slug was taken and a suffix was appended
    pub collided: bool,
}

/// Tracks which source URL owns each slug during a merge
///
/// Once a source URL owns a slug it keeps it, so reprocessing a document
/// never moves its listing.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    owners: HashMap<String, String>,
    by_url: HashMap<String, String>,
}

impl SlugRegistry {
    /// Seeds the registry with the slugs already in the dataset
    pub fn from_listings(listings: &BTreeMap<String, Listing>) -> Self {
        let mut registry = Self::default();
        for (slug, listing) in listings {
            registry.claim(slug.clone(), &listing.record.source_url);
        }
        registry
    }

    /// Returns the slug for `source_url`, allocating `base`, `base-2`,
    /// `base-3`, ... on first sight
    pub fn assign(&mut self, base: &str, source_url: &str) -> SlugAssignment {
        if let Some(slug) = self.by_url.get(source_url) {
            return SlugAssignment {
                slug: slug.clone(),
                collided: false,
            };
        }

        let mut candidate = base.to_string();
        let mut n = 2;
        while self.owners.contains_key(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }

        let collided = candidate != base;
        self.claim(candidate.clone(), source_url);
        SlugAssignment {
            slug: candidate,
            collided,
        }
    }

    fn claim(&mut self, slug: String, source_url: &str) {
        self.by_url.insert(source_url.to_string(), slug.clone());
        self.owners.insert(slug, source_url.to_string());
    }
}
