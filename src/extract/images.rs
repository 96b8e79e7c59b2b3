//! Image discovery
//!
//! # Selection Rules
//!
//! **Main image:** og:image, else the first infobox image, else the first
//! image in the content region.
//!
//! **Excluded:**
//! - `data:` URIs and non-HTTP(S) URLs after resolution
//! - Images declaring a width or height under 80 px
//! - Wiki chrome and icon-like paths (see `CHROME_PATTERNS`), matched against
//!   the URL path so image hosts such as upload.wikimedia.org stay usable
//! - Alt text naming an icon, flag, stub, edit link, arrow, button or symbol
//!
//! Entries are deduplicated by resolved URL.

use crate::extract::metadata::PageMeta;
use crate::extract::record::ImageRef;
use crate::extract::text::clean_text;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const INFOBOX_SELECTORS: &[&str] = &[
    "table.infobox img",
    ".infobox-image img",
    "div[class*=\"infobox\"] img",
];

const CHROME_PATTERNS: &[&str] = &[
    "commons-logo",
    "wikimedia",
    "edit-icon",
    "folder-icon",
    "portal:",
    "flag",
    "coat-of-arms",
    "/40px-",
    "/20px-",
    "ambox",
    "navbox",
    "magnify-clip",
    "wikipedia.png",
    "commons.png",
    "external-link",
    "icon",
    "sprite",
    "commons/thumb",
    "static/images/icons",
    "arrow",
    "button",
    "symbol",
    "logo.svg",
    "wiktionary",
    "wikisource",
];

const CHROME_ALT_WORDS: &[&str] = &["icon", "flag", "stub", "edit", "arrow", "button", "symbol"];

const MIN_DIMENSION: u32 = 80;

/// Most additional images kept per record
pub const MAX_ADDITIONAL_IMAGES: usize = 10;

/// Images chosen for one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSet {
    pub main: Option<String>,
    pub additional: Vec<ImageRef>,
}

/// Collects images from the infobox and the content region
///
/// Relative URLs resolve against `base`, the document's final URL. When
/// `region` is None the whole document is searched.
pub fn collect_images(
    document: &Html,
    meta: &PageMeta,
    region: Option<ElementRef>,
    base: &Url,
) -> ImageSet {
    let mut candidates: Vec<ImageRef> = Vec::new();

    for selector in INFOBOX_SELECTORS {
        if let Ok(selector) = Selector::parse(selector) {
            candidates.extend(document.select(&selector).filter_map(|img| image_ref(img, base)));
        }
    }
    let infobox_count = candidates.len();

    if let Ok(selector) = Selector::parse("img") {
        match region {
            Some(region) => {
                candidates.extend(region.select(&selector).filter_map(|img| image_ref(img, base)))
            }
            None => candidates
                .extend(document.select(&selector).filter_map(|img| image_ref(img, base))),
        }
    }

    let main = meta
        .tag("og:image")
        .and_then(|src| resolve_link(src, base))
        .or_else(|| candidates[..infobox_count].first().map(|i| i.url.clone()))
        .or_else(|| candidates.first().map(|i| i.url.clone()));

    let mut seen: HashSet<String> = HashSet::new();
    if let Some(main) = &main {
        seen.insert(main.clone());
    }

    let additional = candidates
        .into_iter()
        .filter(|image| seen.insert(image.url.clone()))
        .take(MAX_ADDITIONAL_IMAGES)
        .collect();

    ImageSet { main, additional }
}

fn image_ref(img: ElementRef, base: &Url) -> Option<ImageRef> {
    let attrs = img.value();
    let src = attrs.attr("src").or_else(|| attrs.attr("data-src"))?;

    if ["width", "height"]
        .iter()
        .filter_map(|dim| attrs.attr(dim))
        .filter_map(|value| value.trim().trim_end_matches("px").parse::<u32>().ok())
        .any(|px| px < MIN_DIMENSION)
    {
        return None;
    }

    let url = resolve_link(src, base)?;
    let path = Url::parse(&url).ok()?.path().to_lowercase();
    if CHROME_PATTERNS.iter().any(|pattern| path.contains(pattern)) {
        return None;
    }

    let alt = attrs.attr("alt").unwrap_or_default().to_lowercase();
    if CHROME_ALT_WORDS.iter().any(|word| alt.contains(word)) {
        return None;
    }

    let description = attrs
        .attr("alt")
        .map(clean_text)
        .filter(|alt| !alt.is_empty())
        .or_else(|| attrs.attr("title").map(clean_text))
        .unwrap_or_default();

    Some(ImageRef { url, description })
}

/// Resolves an image reference to an absolute HTTP(S) URL
///
/// Returns None for empty references, `data:` URIs, unparsable values and
/// non-HTTP(S) results.
pub fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with("data:") {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
