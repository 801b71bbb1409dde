//! Language utilities for ISO language code handling
//!
//! Request languages may be given as ISO 639-1 (2-letter) or ISO 639-2
//! (3-letter, terminology or bibliographic) codes. Everything is normalized
//! to ISO 639-2/T before comparison so that `fr`, `fra` and `fre` are the
//! same language for the passthrough check.

use anyhow::{anyhow, Result};
use isolang::Language;

use crate::errors::ValidationError;

/// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized_code) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized_code).is_some() {
                return Ok(normalized_code);
            }
            if let Some(terminology) = bibliographic_to_terminology(&normalized_code) {
                return Ok(terminology.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Validate a request language, returning its normalized 639-2/T form
pub fn validate_request_language(code: &str) -> Result<String, ValidationError> {
    normalize_to_part2t(code).map_err(|_| ValidationError::InvalidLanguage(code.to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Two-letter code when one exists, used for phrasebook lookups
pub fn to_part1(code: &str) -> Option<String> {
    let normalized = normalize_to_part2t(code).ok()?;
    Language::from_639_3(&normalized)
        .and_then(|lang| lang.to_639_1())
        .map(|c| c.to_string())
}
