use std::collections::HashMap;
use std::future::Future;

use anyhow::Result;

use review_radar_common::SentimentResult;

/// Sentiment memo keyed by exact text. One instance per pipeline run; never
/// shared across runs, so results cannot leak between configurations.
#[derive(Debug, Default)]
pub struct SentimentCache {
    enabled: bool,
    entries: HashMap<String, SentimentResult>,
    hits: usize,
    misses: usize,
}

impl SentimentCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a stored result, counting the hit or miss.
    pub fn lookup(&mut self, text: &str) -> Option<SentimentResult> {
        match self.entries.get(text) {
            Some(result) => {
                self.hits += 1;
                Some(*result)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Peek without touching the counters.
    pub fn get(&self, text: &str) -> Option<SentimentResult> {
        self.entries.get(text).copied()
    }

    /// Store a result. A disabled cache drops it.
    pub fn insert(&mut self, text: impl Into<String>, result: SentimentResult) {
        if self.enabled {
            self.entries.insert(text.into(), result);
        }
    }

    /// Return the stored result for `text`, or run `compute`, store and return.
    /// `compute` is never invoked on a hit. Errors are not cached.
    pub async fn get_or_compute<F, Fut>(&mut self, text: &str, compute: F) -> Result<SentimentResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SentimentResult>>,
    {
        if let Some(hit) = self.lookup(text) {
            return Ok(hit);
        }
        let result = compute().await?;
        self.insert(text, result);
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
