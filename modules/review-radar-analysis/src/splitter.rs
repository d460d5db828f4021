//! Sentence segmentation.
//!
//! A sentence ends at `.`, `!` or `?` followed by whitespace. Newlines count
//! as whitespace. No locale data is consulted, so output depends only on input.

use std::sync::LazyLock;

use regex::Regex;

use review_radar_common::Sentence;

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary regex"));

/// Split review text into trimmed, non-empty fragments.
pub fn split_text(text: &str) -> Vec<String> {
    let flattened = text.replace(['\r', '\n'], " ");
    let trimmed = flattened.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut start = 0;
    for m in BOUNDARY.find_iter(trimmed) {
        // Keep the terminal punctuation (always one ASCII byte) with its sentence.
        let end = m.start() + 1;
        push_fragment(&mut parts, &trimmed[start..end]);
        start = m.end();
    }
    push_fragment(&mut parts, &trimmed[start..]);

    if parts.is_empty() {
        parts.push(trimmed.to_string());
    }
    parts
}

/// Split a review into sentences tagged with the review id.
pub fn split(review_id: usize, text: &str) -> Vec<Sentence> {
    split_text(text)
        .into_iter()
        .map(|s| Sentence::new(s, review_id))
        .collect()
}

fn push_fragment(parts: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        parts.push(fragment.to_string());
    }
}
