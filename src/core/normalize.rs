//! Text normalization and canonicalization
//!
//! Turns arbitrary user input into a stable, comparable form used both as the
//! cache-key component and as the text forwarded to the AI provider. The
//! allow-list keeps letters (including extended-Latin accents), digits used in
//! Darija romanization (3, 7, 9...), apostrophes and hyphens.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static EDGE_PUNCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^0-9A-Za-z\x{C0}-\x{24F}'’\-]+|[^0-9A-Za-z\x{C0}-\x{24F}'’\-]+$").unwrap()
});

static DISALLOWED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z\x{C0}-\x{24F}'’\-\s]+").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Common romanization variants folded into one canonical token, so that
/// near-duplicate spellings of the same Darija word share a cache entry.
static DEFAULT_OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("bosa", "bousa"),
        ("bwsa", "bousa"),
        ("wafin", "fin"),
        ("wfayn", "fin"),
        ("wfin", "fin"),
        ("3atini", "3tini"),
        ("khoya", "khouya"),
    ])
});

/// The built-in romanization override table
pub fn default_overrides() -> &'static HashMap<&'static str, &'static str> {
    &DEFAULT_OVERRIDES
}

/// Normalize raw user text: trim, lowercase, strip surrounding punctuation,
/// collapse disallowed runs and repeated whitespace into single spaces.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.trim().to_lowercase();
    let edged = EDGE_PUNCT.replace_all(&lowered, "");
    let spaced = DISALLOWED_RUN.replace_all(&edged, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&spaced, " ");
    collapsed.trim().to_string()
}

/// Replace tokens found verbatim in `overrides` with their canonical form.
///
/// Must run after [`normalize`]: override keys are exact lowercase tokens.
pub fn apply_overrides(text: &str, overrides: &HashMap<&str, &str>) -> String {
    if text.is_empty() {
        return String::new();
    }

    text.split_whitespace()
        .map(|word| *overrides.get(word).unwrap_or(&word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full canonicalization pipeline with the built-in override table
pub fn canonicalize(text: &str) -> String {
    apply_overrides(&normalize(text), default_overrides())
}
