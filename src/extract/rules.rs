//! Field extraction rule chains
//!
//! Each field has an ordered list of independent rules. A chain runs its
//! rules in order and stops at the first one that returns a value. A rule
//! may attach a note explaining a weak source; a chain where every rule
//! misses records "no <field> found".

use crate::extract::metadata::PageMeta;
use crate::extract::text::{clean_text, clean_title};
use regex::Regex;
use std::sync::LazyLock;

/// Schema.org types describing a show
const SERIES_TYPES: &[&str] = &[
    "TVSeries",
    "CreativeWorkSeries",
    "CreativeWork",
    "Movie",
    "TVSeason",
];

/// Schema.org types describing a toy product
const PRODUCT_TYPES: &[&str] = &["Product", "ProductGroup", "Brand"];

/// Known toy makers in canonical spelling
const MAKERS: &[&str] = &[
    "Hasbro", "Mattel", "Bandai", "Kenner", "Playmates", "LJN", "Coleco", "Tonka", "Galoob", "Tomy",
    "Takara", "Matchbox", "Tyco", "Remco",
];

/// Input visible to every rule
///
/// Later chains see the values earlier chains produced.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub meta: &'a PageMeta,

    /// Readable text with dashes normalized
    pub text: &'a str,

    pub show_title: Option<&'a str>,
    pub years_aired: Option<&'a str>,
    pub years_toyline: Option<&'a str>,
}

impl<'a> Context<'a> {
    pub fn new(meta: &'a PageMeta, text: &'a str) -> Self {
        Self {
            meta,
            text,
            show_title: None,
            years_aired: None,
            years_toyline: None,
        }
    }
}

/// A rule's answer: the value plus an optional explanatory note
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub value: String,
    pub note: Option<String>,
}

impl RuleHit {
    fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            note: None,
        }
    }

    fn noted(value: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            note: Some(note.into()),
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&Context) -> Option<RuleHit>,
}

/// Runs `chain` until the first hit, appending notes to `notes`
pub fn run_chain(
    field: &str,
    chain: &[Rule],
    ctx: &Context,
    notes: &mut Vec<String>,
) -> Option<String> {
    for rule in chain {
        if let Some(hit) = (rule.apply)(ctx) {
            tracing::trace!("{} = {:?} (rule: {})", field, hit.value, rule.name);
            if let Some(note) = hit.note {
                notes.push(note);
            }
            return Some(hit.value);
        }
    }

    notes.push(format!("no {} found", field));
    None
}

// ===== Patterns =====

fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("field pattern {:?} should compile: {}", re, e))
}

/// A year or a year span, e.g. `1985`, `1985-1987`, `1983 to 86`
const YEAR_SPAN: &str = r"(\d{4}(?:\s*(?:-|to|through|until|and)\s*\d{2,4})?)";

static SHOW_IN_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b([A-Z][\w'.:&!-]*(?:\s+[A-Z0-9][\w'.:&!-]*){0,5})\s*\((?:TV|[Tt]elevision|[Aa]nimated)\s+(?:series|show)\)")
});

static SHOW_IS_ANIMATED: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b([A-Z][\w'.:&!-]*(?:\s+(?:of|the|and|[A-Z0-9][\w'.:&!-]*)){0,6})\s+(?:is|was)\s+an?\s+(?:[\w-]+\s+){0,4}animated\s+(?:[\w-]+\s+){0,3}(?:series|show|cartoon)")
});

static TOYLINE_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b([A-Z][\w'.:&!-]*(?:\s+(?:of|the|and|[A-Z0-9][\w'.:&!-]*)){0,6})\s+(?:toy ?line|line of (?:toys|action figures)|action[- ]figures?|toys)\b")
});

static AIRED_YEARS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"(?i)\b(?:aired|broadcast|ran)\s+(?:originally\s+)?(?:from\s+|in\s+|between\s+)?{}\b",
        YEAR_SPAN
    ))
});

static YEAR_RANGE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\b(\d{4}-\d{4}|\d{4}-\d{2})\b"));

static TOYLINE_YEARS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"(?i)\b(?:toys?|figures?|toy ?line)\s+(?:were\s+|was\s+)?(?:produced|made|released|sold)\s+(?:from\s+|in\s+|between\s+)?{}\b",
        YEAR_SPAN
    ))
});

static SPAN_JOINER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\s*(?:-|to|through|until|and)\s*"));

static ANY_YEAR: LazyLock<Regex> = LazyLock::new(|| pattern(r"\b(19\d{2})\b"));

static ERA_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(early[\s-]+nineties|early[\s-]+90s|eighties|'80s)")
});

static MAKER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"(?i)\b({})\b", MAKERS.join("|")))
});

static COUNTRY_MADE_IN: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(?:produced|made|created|animated)\s+in\s+(?:the\s+)?(united states|usa|u\.s|america|japan|canada|united kingdom|uk|britain|france)\b")
});

static COUNTRY_ADJECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(american|japanese|canadian|british|french)(?:-[a-z]+)?\s+(?:animated|cartoon|television|tv|children's)")
});

static STUDIO_PRODUCED_BY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b(?:[Pp]roduced|[Aa]nimated|[Cc]reated)\s+by\s+([A-Z][\w&'./-]*(?:\s+[A-Z][\w&'./-]*){0,4}\s+(?:Studios?|Productions?|Entertainment|Animation))\b")
});

static NETWORK_AIRED_ON: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b(?:aired|broadcast|shown|ran)\s+on\s+(?:the\s+)?([A-Z][\w&'./-]*(?:\s+[A-Z][\w&'./-]*){0,3}\s+(?:Network|Channel|TV|Television|Broadcasting))\b")
});

static KNOWN_NETWORK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\b(NBC|CBS|ABC|Fox Kids|[Ss]yndication)\b"));

// ===== Helpers =====

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .filter(|s| !s.is_empty())
}

/// Part of a captured name after its last sentence break
fn last_clause(name: &str) -> &str {
    name.rsplit(". ").next().unwrap_or(name)
}

/// Normalizes a year span to `YYYY` or `YYYY-YY[YY]`
fn normalize_span(span: &str) -> String {
    SPAN_JOINER.replace(span.trim(), "-").into_owned()
}

fn first_year(span: &str) -> Option<u32> {
    span.get(..4)?.parse().ok()
}

/// Era label for a year
pub fn era_for_year(year: u32) -> String {
    match year {
        1980..=1989 => "1980s".to_string(),
        1990..=1993 => "early 1990s".to_string(),
        1994..=1996 => "mid 1990s".to_string(),
        1997..=1999 => "late 1990s".to_string(),
        _ => format!("{}0s", year / 10),
    }
}

fn canonical_maker(name: &str) -> String {
    MAKERS
        .iter()
        .find(|m| m.eq_ignore_ascii_case(name.trim()))
        .map(|m| m.to_string())
        .unwrap_or_else(|| clean_text(name))
}

/// Maps a country name or adjective onto a canonical country
pub fn canonical_country(raw: &str) -> String {
    let key = raw.trim().trim_end_matches('.').to_lowercase();
    match key.as_str() {
        "american" | "usa" | "us" | "u.s" | "america" | "united states" => "United States",
        "japanese" | "japan" => "Japan",
        "canadian" | "canada" => "Canada",
        "british" | "uk" | "britain" | "united kingdom" => "United Kingdom",
        "french" | "france" => "France",
        _ => return clean_text(raw),
    }
    .to_string()
}

// ===== show_title =====

fn show_title_json_ld(ctx: &Context) -> Option<RuleHit> {
    let name = ctx.meta.ld_value(SERIES_TYPES, "name")?;
    clean_title(&name).map(RuleHit::plain)
}

fn show_title_og(ctx: &Context) -> Option<RuleHit> {
    clean_title(ctx.meta.tag("og:title")?).map(RuleHit::plain)
}

fn show_title_tag(ctx: &Context) -> Option<RuleHit> {
    clean_title(ctx.meta.title.as_deref()?).map(RuleHit::plain)
}

fn show_title_h1(ctx: &Context) -> Option<RuleHit> {
    clean_title(ctx.meta.h1.as_deref()?).map(RuleHit::plain)
}

fn show_title_text(ctx: &Context) -> Option<RuleHit> {
    let head: String = ctx.text.chars().take(1000).collect();
    [&*SHOW_IN_PARENS, &*SHOW_IS_ANIMATED]
        .into_iter()
        .filter_map(|re| first_capture(re, &head))
        .find_map(|candidate| clean_title(last_clause(&candidate)))
        .map(|title| RuleHit::noted(title, "show_title from text pattern"))
}

pub const SHOW_TITLE: &[Rule] = &[
    Rule { name: "json-ld name", apply: show_title_json_ld },
    Rule { name: "og:title", apply: show_title_og },
    Rule { name: "title tag", apply: show_title_tag },
    Rule { name: "first h1", apply: show_title_h1 },
    Rule { name: "text pattern", apply: show_title_text },
];

// ===== toyline_name =====

fn toyline_json_ld(ctx: &Context) -> Option<RuleHit> {
    let name = ctx.meta.ld_value(PRODUCT_TYPES, "name")?;
    clean_title(&name).map(RuleHit::plain)
}

fn toyline_text(ctx: &Context) -> Option<RuleHit> {
    TOYLINE_NAMED
        .captures_iter(ctx.text)
        .filter_map(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .map(|name| last_clause(&name).trim_start_matches("The ").to_string())
        .filter(|name| !MAKERS.iter().any(|m| m.eq_ignore_ascii_case(name)))
        .find_map(|name| clean_title(&name))
        .map(|name| RuleHit::noted(name, "toyline_name from text pattern"))
}

fn toyline_from_show(ctx: &Context) -> Option<RuleHit> {
    ctx.show_title
        .map(|title| RuleHit::noted(title, "toyline_name assumed same as show_title"))
}

pub const TOYLINE_NAME: &[Rule] = &[
    Rule { name: "json-ld product", apply: toyline_json_ld },
    Rule { name: "text pattern", apply: toyline_text },
    Rule { name: "show title", apply: toyline_from_show },
];

// ===== years_aired =====

fn years_aired_json_ld(ctx: &Context) -> Option<RuleHit> {
    let start = first_year(&ctx.meta.ld_value(SERIES_TYPES, "startDate")?)?;
    let end = ctx
        .meta
        .ld_value(SERIES_TYPES, "endDate")
        .and_then(|d| first_year(&d));
    let value = match end {
        Some(end) if end != start => format!("{}-{}", start, end),
        _ => start.to_string(),
    };
    Some(RuleHit::plain(value))
}

fn years_aired_phrase(ctx: &Context) -> Option<RuleHit> {
    first_capture(&AIRED_YEARS, ctx.text).map(|span| RuleHit::plain(normalize_span(&span)))
}

fn years_aired_range(ctx: &Context) -> Option<RuleHit> {
    first_capture(&YEAR_RANGE_TOKEN, ctx.text)
        .map(|span| RuleHit::noted(span, "years_aired from first year range in text"))
}

pub const YEARS_AIRED: &[Rule] = &[
    Rule { name: "json-ld dates", apply: years_aired_json_ld },
    Rule { name: "aired phrase", apply: years_aired_phrase },
    Rule { name: "year range token", apply: years_aired_range },
];

// ===== years_toyline =====

fn years_toyline_phrase(ctx: &Context) -> Option<RuleHit> {
    first_capture(&TOYLINE_YEARS, ctx.text).map(|span| RuleHit::plain(normalize_span(&span)))
}

pub const YEARS_TOYLINE: &[Rule] = &[Rule { name: "produced phrase", apply: years_toyline_phrase }];

// ===== era =====

fn era_from_aired(ctx: &Context) -> Option<RuleHit> {
    let year = first_year(ctx.years_aired?)?;
    Some(RuleHit::plain(era_for_year(year)))
}

fn era_from_toyline(ctx: &Context) -> Option<RuleHit> {
    let year = first_year(ctx.years_toyline?)?;
    Some(RuleHit::plain(era_for_year(year)))
}

fn era_from_any_year(ctx: &Context) -> Option<RuleHit> {
    let year: u32 = first_capture(&ANY_YEAR, ctx.text)?.parse().ok()?;
    Some(RuleHit::noted(
        era_for_year(year),
        format!("era inferred from the year {} in text", year),
    ))
}

fn era_from_words(ctx: &Context) -> Option<RuleHit> {
    let word = first_capture(&ERA_WORDS, ctx.text)?.to_lowercase();
    let era = if word.starts_with("early") {
        "early 1990s"
    } else {
        "1980s"
    };
    Some(RuleHit::noted(era, format!("era inferred from '{}'", word)))
}

pub const ERA: &[Rule] = &[
    Rule { name: "years aired", apply: era_from_aired },
    Rule { name: "years toyline", apply: era_from_toyline },
    Rule { name: "first 19xx year", apply: era_from_any_year },
    Rule { name: "era words", apply: era_from_words },
];

// ===== manufacturer =====

fn manufacturer_json_ld(ctx: &Context) -> Option<RuleHit> {
    ctx.meta
        .ld_value(&[], "manufacturer")
        .or_else(|| ctx.meta.ld_value(PRODUCT_TYPES, "brand"))
        .map(|name| RuleHit::plain(canonical_maker(&name)))
}

fn manufacturer_known(ctx: &Context) -> Option<RuleHit> {
    first_capture(&MAKER, ctx.text).map(|name| RuleHit::plain(canonical_maker(&name)))
}

pub const MANUFACTURER: &[Rule] = &[
    Rule { name: "json-ld manufacturer", apply: manufacturer_json_ld },
    Rule { name: "known maker", apply: manufacturer_known },
];

// ===== country =====

fn country_json_ld(ctx: &Context) -> Option<RuleHit> {
    let raw = ctx.meta.ld_value(&[], "countryOfOrigin")?;
    Some(RuleHit::plain(canonical_country(&raw)))
}

fn country_made_in(ctx: &Context) -> Option<RuleHit> {
    first_capture(&COUNTRY_MADE_IN, ctx.text).map(|raw| RuleHit::plain(canonical_country(&raw)))
}

fn country_adjective(ctx: &Context) -> Option<RuleHit> {
    first_capture(&COUNTRY_ADJECTIVE, ctx.text).map(|raw| RuleHit::plain(canonical_country(&raw)))
}

pub const COUNTRY: &[Rule] = &[
    Rule { name: "json-ld countryOfOrigin", apply: country_json_ld },
    Rule { name: "made in", apply: country_made_in },
    Rule { name: "nationality adjective", apply: country_adjective },
];

// ===== studio_network =====

fn studio_json_ld(ctx: &Context) -> Option<RuleHit> {
    ctx.meta
        .ld_value(&[], "productionCompany")
        .or_else(|| ctx.meta.ld_value(SERIES_TYPES, "publisher"))
        .map(RuleHit::plain)
}

fn studio_produced_by(ctx: &Context) -> Option<RuleHit> {
    first_capture(&STUDIO_PRODUCED_BY, ctx.text).map(RuleHit::plain)
}

fn network_aired_on(ctx: &Context) -> Option<RuleHit> {
    first_capture(&NETWORK_AIRED_ON, ctx.text).map(RuleHit::plain)
}

fn network_known(ctx: &Context) -> Option<RuleHit> {
    let name = first_capture(&KNOWN_NETWORK, ctx.text)?;
    let name = if name.eq_ignore_ascii_case("syndication") {
        "Syndication".to_string()
    } else {
        name
    };
    Some(RuleHit::plain(name))
}

pub const STUDIO_NETWORK: &[Rule] = &[
    Rule { name: "json-ld production company", apply: studio_json_ld },
    Rule { name: "produced by", apply: studio_produced_by },
    Rule { name: "aired on", apply: network_aired_on },
    Rule { name: "known network", apply: network_known },
];
