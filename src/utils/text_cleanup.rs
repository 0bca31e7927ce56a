//! Cleanup of human-readable text taken from the OpenAPI document

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid regex pattern"));

static HTML_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex pattern"));

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

/// Strips HTML tags and normalizes whitespace to single spaces
///
/// `<br>` becomes a space so that words on either side stay apart.
pub fn clean_description(raw: &str) -> String {
    let text = LINE_BREAK_TAG_REGEX.replace_all(raw, " ");
    let text = HTML_TAG_REGEX.replace_all(&text, "");
    WHITESPACE_REGEX.replace_all(&text, " ").trim().to_string()
}
