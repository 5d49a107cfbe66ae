//! Case-insensitive term matching shared by source adapters and the alert
//! evaluator.

use std::collections::HashSet;

/// True if `needle` occurs anywhere in `haystack`, ignoring case.
#[must_use]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Collect the monitored terms that appear in `text` (case-insensitive
/// substring match). Duplicate matches collapse to one entry; order follows
/// the term list, so output is deterministic for identical input.
#[must_use]
pub fn extract_brand_mentions(text: &str, terms: &[String]) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for term in terms {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if lower.contains(&needle) && seen.insert(needle) {
            matched.push(term.clone());
        }
    }
    matched
}

/// Truncate to at most `max_chars` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
