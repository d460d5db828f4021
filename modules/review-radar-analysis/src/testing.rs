// Test stand-ins for the model capabilities.
//
// - LexiconClassifier (SentimentClassifier): word-list polarity, counts calls
// - FixedClassifier (SentimentClassifier): text -> raw label table
// - FailingClassifier (SentimentClassifier): every call errors
// - StubAspectScorer (AspectScorer): (sentence, label) -> score table
//
// All deterministic, no network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::traits::{AspectScorer, AspectScores, RawSentiment, SentimentClassifier};

// ---------------------------------------------------------------------------
// LexiconClassifier
// ---------------------------------------------------------------------------

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "great", "good", "excellent", "love", "loved", "bright", "perfect", "awesome",
    "happy", "nice", "best", "superb", "crisp", "quick",
];

const NEGATIVE_WORDS: &[&str] = &[
    "terrible", "bad", "awful", "poor", "drains", "hate", "worst", "broken", "slow",
    "disappointing", "horrible", "rude", "cracked", "laggy",
];

/// Word-list sentiment. Positive hits minus negative hits decides the label;
/// confidence grows with the margin. Records every text it is asked about.
pub struct LexiconClassifier {
    ordinal_labels: bool,
    calls: AtomicUsize,
    batches: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            ordinal_labels: false,
            calls: AtomicUsize::new(0),
            batches: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Emit `LABEL_0/1/2` instead of named labels.
    pub fn ordinal(mut self) -> Self {
        self.ordinal_labels = true;
        self
    }

    /// Number of texts classified.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// How many times `text` was sent to the classifier.
    pub fn times_seen(&self, text: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|t| *t == text).count()
    }

    fn judge(&self, text: &str) -> RawSentiment {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let pos = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count() as i64;
        let neg = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count() as i64;
        let margin = (pos - neg).unsigned_abs() as f64;
        let confidence = (0.6 + 0.15 * margin).min(0.99);

        let (named, ordinal) = match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => ("positive", "LABEL_2"),
            std::cmp::Ordering::Less => ("negative", "LABEL_0"),
            std::cmp::Ordering::Equal => ("neutral", "LABEL_1"),
        };
        let label = if self.ordinal_labels { ordinal } else { named };
        RawSentiment::new(label, confidence)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawSentiment>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| self.judge(t)).collect())
    }
}

// ---------------------------------------------------------------------------
// FixedClassifier
// ---------------------------------------------------------------------------

/// Table-driven classifier. Unregistered texts come back as `fallback`.
pub struct FixedClassifier {
    table: HashMap<String, RawSentiment>,
    fallback: RawSentiment,
    vocabulary: Option<Vec<String>>,
}

impl FixedClassifier {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            fallback: RawSentiment::new("neutral", 0.5),
            vocabulary: None,
        }
    }

    pub fn on(mut self, text: &str, label: &str, confidence: f64) -> Self {
        self.table
            .insert(text.to_string(), RawSentiment::new(label, confidence));
        self
    }

    pub fn fallback(mut self, label: &str, confidence: f64) -> Self {
        self.fallback = RawSentiment::new(label, confidence);
        self
    }

    pub fn with_vocabulary(mut self, labels: &[&str]) -> Self {
        self.vocabulary = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }
}

impl Default for FixedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for FixedClassifier {
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawSentiment>> {
        Ok(texts
            .iter()
            .map(|t| self.table.get(t).cloned().unwrap_or_else(|| self.fallback.clone()))
            .collect())
    }

    fn label_vocabulary(&self) -> Option<Vec<String>> {
        self.vocabulary.clone()
    }
}

// ---------------------------------------------------------------------------
// FailingClassifier
// ---------------------------------------------------------------------------

pub struct FailingClassifier {
    message: String,
}

impl FailingClassifier {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl SentimentClassifier for FailingClassifier {
    async fn classify_batch(&self, _texts: &[String]) -> Result<Vec<RawSentiment>> {
        bail!("{}", self.message)
    }
}

// ---------------------------------------------------------------------------
// StubAspectScorer
// ---------------------------------------------------------------------------

/// Scores looked up by `(sentence, label)`; anything unregistered scores 0.
pub struct StubAspectScorer {
    scores: HashMap<(String, String), f64>,
    batch_calls: AtomicUsize,
}

impl StubAspectScorer {
    pub fn new() -> Self {
        Self {
            scores: HashMap::new(),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn on(mut self, sentence: &str, label: &str, score: f64) -> Self {
        self.scores
            .insert((sentence.to_string(), label.to_string()), score);
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

impl Default for StubAspectScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AspectScorer for StubAspectScorer {
    async fn score(&self, sentence: &str, candidates: &[String]) -> Result<AspectScores> {
        Ok(candidates
            .iter()
            .map(|label| {
                let score = self
                    .scores
                    .get(&(sentence.to_string(), label.clone()))
                    .copied()
                    .unwrap_or(0.0);
                (label.clone(), score)
            })
            .collect())
    }

    async fn score_batch(
        &self,
        sentences: &[String],
        candidates: &[String],
    ) -> Result<Vec<AspectScores>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut out = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            out.push(self.score(sentence, candidates).await?);
        }
        Ok(out)
    }
}
