//! Field normalization shared by the provider adapters.

use super::types::IspType;
use crate::config::MAX_TEXT_FIELD_CHARS;

/// Placeholder values providers use for "unknown".
const UNKNOWN_PLACEHOLDERS: &[&str] = &["-", "n/a", "na", "unknown", "null", "none"];

/// Product words that identify a mobile connection.
///
/// Carrier brand names are not listed: Vivo, Claro and TIM also sell fixed
/// broadband under the same name.
const MOBILE_KEYWORDS: &[&str] = &[
    "mobile",
    "movel",
    "moveis",
    "moviles",
    "movil",
    "wireless",
    "cellular",
    "celular",
];

/// Words and phrases that identify datacenter and hosting ranges.
const HOSTING_KEYWORDS: &[&str] = &[
    "hosting",
    "datacenter",
    "data center",
    "cloud",
    "amazon",
    "aws",
    "google llc",
    "google cloud",
    "microsoft",
    "azure",
    "digitalocean",
    "linode",
    "akamai",
    "ovh",
    "ovhcloud",
    "hetzner",
    "vultr",
    "m247",
    "leaseweb",
    "choopa",
];

/// Trims a text field; empty strings and placeholders become `None`.
///
/// Values longer than `MAX_TEXT_FIELD_CHARS` are cut at a character boundary.
pub fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if UNKNOWN_PLACEHOLDERS.contains(&lower.as_str()) {
        return None;
    }
    if trimmed.chars().count() > MAX_TEXT_FIELD_CHARS {
        return Some(trimmed.chars().take(MAX_TEXT_FIELD_CHARS).collect());
    }
    Some(trimmed.to_string())
}

/// Normalizes a country code to upper-case ISO alpha-2.
///
/// Values that are not two ASCII letters are dropped; a full country name
/// would never match another provider's code anyway.
pub fn clean_country(value: Option<String>) -> Option<String> {
    let value = clean_text(value)?;
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(value.to_ascii_uppercase())
    } else {
        None
    }
}

/// Normalizes a postal code for comparison between providers.
///
/// Upper-cases and strips spaces and dashes so `01310-100` matches `01310100`.
pub fn normalize_zip(zip: &str) -> Option<String> {
    let normalized: String = zip
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Lower-cased alphanumeric words of `text`, with Portuguese and Spanish
/// accents folded so "Móvel" matches "movel".
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.chars().flat_map(char::to_lowercase).map(fold_accent).collect())
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'ê' | 'è' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// True if any keyword appears in `words` as a whole word, or as a run of
/// consecutive whole words for multi-word phrases.
fn contains_keyword(words: &[String], keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        let phrase: Vec<&str> = keyword.split(' ').collect();
        words
            .windows(phrase.len())
            .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
    })
}

/// Classifies an ISP/organisation string by keyword.
///
/// Keywords match whole words only, so "Dawson" is not "aws". No
/// organisation means `Unknown`; an organisation matching neither the
/// mobile nor the hosting vocabulary is assumed to be a fixed line.
pub fn classify_isp(org: Option<&str>) -> IspType {
    let Some(org) = org.map(str::trim).filter(|o| !o.is_empty()) else {
        return IspType::Unknown;
    };
    let words = words(org);
    if contains_keyword(&words, MOBILE_KEYWORDS) {
        return IspType::Mobile;
    }
    if contains_keyword(&words, HOSTING_KEYWORDS) {
        return IspType::Hosting;
    }
    IspType::Fixed
}

/// Combines explicit provider flags with the keyword classification.
pub fn resolve_isp_type(mobile_flag: bool, hosting_flag: bool, org: Option<&str>) -> IspType {
    if mobile_flag {
        IspType::Mobile
    } else if hosting_flag {
        IspType::Hosting
    } else {
        classify_isp(org)
    }
}

/// Parses ipinfo-style `"lat,lon"` strings.
pub fn parse_lat_lon(value: &str) -> Option<(f64, f64)> {
    let (lat, lon) = value.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}
