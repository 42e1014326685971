//! Text statistics derived from a single normalized line.
//!
//! Every function here is pure and operates on already-extracted text; no
//! geometry or font information is involved.

use std::sync::OnceLock;

use regex::Regex;

/// Lines with at most this many words are flagged as short.
pub const SHORT_LINE_MAX_WORDS: usize = 8;

/// Collapse every run of two or more whitespace characters to a single space
/// and trim both ends.
///
/// A lone tab or newline inside the text is left untouched; only runs are
/// collapsed.
pub fn normalize_text(raw: &str) -> String {
    static RE_WS: OnceLock<Regex> = OnceLock::new();
    let re = RE_WS.get_or_init(|| Regex::new(r"\s{2,}").unwrap());
    re.replace_all(raw, " ").trim().to_string()
}

/// Returns `true` if the text contains at least one alphanumeric character.
pub fn has_alphanumeric(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Number of alphanumeric characters in the text.
pub fn alphanumeric_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in characters (not bytes).
pub fn char_length(text: &str) -> usize {
    text.chars().count()
}

/// `true` iff the text equals its own upper-cased form.
///
/// Text without any cased letters (digits, punctuation) trivially counts as
/// upper.
pub fn is_upper(text: &str) -> bool {
    text.to_uppercase() == text
}

/// `true` iff the text starts with a `\d+(\.\d+)*` section number.
pub fn is_numbered(text: &str) -> bool {
    static RE_NUM: OnceLock<Regex> = OnceLock::new();
    let re = RE_NUM.get_or_init(|| Regex::new(r"^\d+(\.\d+)*").unwrap());
    re.is_match(text)
}

/// `true` iff the final character is a colon. A colon anywhere else does not
/// count.
pub fn ends_with_colon(text: &str) -> bool {
    text.ends_with(':')
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
