//! Extractor: raw HTML to a structured show/toyline record
//!
//! Extraction is total. Whatever the input, a record comes back; every
//! field a heuristic could not fill leaves a line in `parse_notes`.
//!
//! # Pipeline
//!
//! 1. Parse the HTML into a tree
//! 2. Read declared metadata (title, meta tags, JSON-LD)
//! 3. Pick the main content block and read its text
//! 4. Run the per-field rule chains, metadata first, then text patterns
//! 5. Collect images and notable characters

mod characters;
mod images;
mod metadata;
mod readability;
mod record;
mod rules;
mod text;

pub use characters::extract_characters;
pub use images::{collect_images, ImageSet};
pub use metadata::PageMeta;
pub use readability::readable_text;
pub use record::{ExtractedRecord, ImageRef};
pub use rules::{era_for_year, run_chain, Context, Rule, RuleHit};
pub use text::clean_title;

use crate::crawler::RawDocument;
use scraper::Html;
use url::Url;

/// Extracts a record from a fetched document
pub fn extract(doc: &RawDocument) -> ExtractedRecord {
    let mut notes = Vec::new();

    let html = if doc.is_html() {
        doc.text()
    } else {
        notes.push(format!(
            "unsupported content type {}",
            doc.content_type.as_deref().unwrap_or("unknown")
        ));
        String::new()
    };

    let document = Html::parse_document(&html);
    let meta = PageMeta::from_document(&document);
    let region = readability::main_content(&document);
    let raw_text = match region {
        Some(region) => readability::region_text(region),
        None => readable_text(&document),
    };
    if raw_text.is_empty() {
        notes.push("no readable text found".to_string());
    }

    let pattern_text = text::normalize_dashes(&raw_text);
    let mut ctx = Context::new(&meta, &pattern_text);

    let show_title = run_chain("show_title", rules::SHOW_TITLE, &ctx, &mut notes);
    ctx.show_title = show_title.as_deref();
    let toyline_name = run_chain("toyline_name", rules::TOYLINE_NAME, &ctx, &mut notes);
    let years_aired = run_chain("years_aired", rules::YEARS_AIRED, &ctx, &mut notes);
    ctx.years_aired = years_aired.as_deref();
    let years_toyline = run_chain("years_toyline", rules::YEARS_TOYLINE, &ctx, &mut notes);
    ctx.years_toyline = years_toyline.as_deref();
    let era = run_chain("era", rules::ERA, &ctx, &mut notes);
    let manufacturer = run_chain("manufacturer", rules::MANUFACTURER, &ctx, &mut notes);
    let country = run_chain("country", rules::COUNTRY, &ctx, &mut notes);
    let studio_network = run_chain("studio_network", rules::STUDIO_NETWORK, &ctx, &mut notes);

    let titles: Vec<&str> = [show_title.as_deref(), toyline_name.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let notable_characters = extract_characters(&raw_text, &titles);
    if notable_characters.is_empty() {
        notes.push("no notable_characters found".to_string());
    }

    let images = match Url::parse(&doc.final_url).or_else(|_| Url::parse(&doc.url)) {
        Ok(base) => collect_images(&document, &meta, region, &base),
        Err(e) => {
            notes.push(format!("cannot resolve images against {}: {}", doc.final_url, e));
            ImageSet::default()
        }
    };
    if images.main.is_none() {
        notes.push("no main_image_url found".to_string());
    }

    let source_title = meta
        .title
        .clone()
        .or_else(|| meta.tag("og:title").map(str::to_string))
        .unwrap_or_else(|| doc.url.clone());

    tracing::debug!(
        "Extracted {}: show={:?} toyline={:?} ({} notes)",
        doc.url,
        show_title,
        toyline_name,
        notes.len()
    );

    ExtractedRecord {
        source_url: doc.url.clone(),
        source_title,
        show_title,
        toyline_name,
        era,
        years_aired,
        years_toyline,
        manufacturer,
        country,
        studio_network,
        notable_characters,
        main_image_url: images.main,
        additional_images: images.additional,
        raw_text_for_summary: raw_text,
        parse_notes: notes,
    }
}
