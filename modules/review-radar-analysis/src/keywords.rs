//! Distinguishing terms of a sub-corpus, ranked by summed TF-IDF weight.
//!
//! Smoothed scheme: raw counts, `idf = ln((1 + n) / (1 + df)) + 1`, each
//! document vector L2-normalised, weights summed across documents. The
//! vocabulary is capped at the most frequent terms of the corpus.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use review_radar_common::KeywordWeight;

pub const MAX_VOCABULARY: usize = 500;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "almost", "also", "although",
        "always", "am", "among", "an", "and", "another", "any", "anyhow", "anyone", "anything",
        "are", "around", "as", "at", "back", "be", "became", "because", "become", "been",
        "before", "being", "below", "besides", "between", "both", "but", "by", "can", "cannot",
        "could", "did", "do", "does", "doing", "done", "down", "due", "during", "each", "eg",
        "either", "else", "enough", "etc", "even", "ever", "every", "few", "for", "from",
        "further", "get", "give", "go", "had", "has", "have", "having", "he", "her", "here",
        "hers", "herself", "him", "himself", "his", "how", "however", "ie", "if", "in", "into",
        "is", "it", "its", "itself", "just", "keep", "last", "least", "less", "made", "many",
        "may", "me", "might", "mine", "more", "most", "mostly", "much", "must", "my", "myself",
        "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor", "not",
        "nothing", "now", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
        "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per",
        "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed", "seems",
        "several", "she", "should", "since", "so", "some", "somehow", "someone", "something",
        "sometime", "sometimes", "still", "such", "than", "that", "the", "their", "theirs",
        "them", "themselves", "then", "there", "these", "they", "this", "those", "though",
        "through", "thus", "to", "together", "too", "toward", "towards", "under", "until", "up",
        "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
        "whenever", "where", "whether", "which", "while", "who", "whoever", "whole", "whom",
        "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
        "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Lower-cased tokens of two or more word characters, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .map(String::from)
        .collect()
}

/// Top `n` terms of `corpus` by summed TF-IDF weight. Ties keep the order in
/// which terms first appear. An empty corpus yields an empty list.
pub fn top_terms(corpus: &[String], n: usize) -> Vec<KeywordWeight> {
    if corpus.is_empty() || n == 0 {
        return Vec::new();
    }

    let docs: Vec<Vec<String>> = corpus.iter().map(|d| tokenize(d)).collect();

    // Corpus frequency and first appearance of every term.
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for token in docs.iter().flatten() {
        let next = first_seen.len();
        first_seen.entry(token.as_str()).or_insert(next);
        *frequency.entry(token.as_str()).or_default() += 1;
    }
    if first_seen.is_empty() {
        return Vec::new();
    }

    let mut vocabulary: Vec<&str> = first_seen.keys().copied().collect();
    vocabulary.sort_by(|a, b| {
        frequency[b]
            .cmp(&frequency[a])
            .then(first_seen[a].cmp(&first_seen[b]))
    });
    vocabulary.truncate(MAX_VOCABULARY);
    let kept: HashSet<&str> = vocabulary.iter().copied().collect();

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        let unique: HashSet<&str> = doc
            .iter()
            .map(String::as_str)
            .filter(|t| kept.contains(t))
            .collect();
        for term in unique {
            *document_frequency.entry(term).or_default() += 1;
        }
    }

    let n_docs = docs.len() as f64;
    let idf = |term: &str| {
        let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
        ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
    };

    let mut weights: HashMap<&str, f64> = HashMap::new();
    for doc in &docs {
        let mut counts: HashMap<&str, f64> = HashMap::new();
        for term in doc.iter().map(String::as_str).filter(|t| kept.contains(t)) {
            *counts.entry(term).or_default() += 1.0;
        }
        let vector: Vec<(&str, f64)> = counts
            .into_iter()
            .map(|(term, tf)| (term, tf * idf(term)))
            .collect();
        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (term, w) in vector {
            *weights.entry(term).or_default() += w / norm;
        }
    }

    let mut ranked: Vec<(&str, f64)> = weights.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then(first_seen[a.0].cmp(&first_seen[b.0]))
    });
    ranked
        .into_iter()
        .take(n)
        .map(|(term, score)| KeywordWeight {
            term: term.to_string(),
            score,
        })
        .collect()
}
