// Capability seams consumed by the pipeline.
//
// SentimentClassifier and AspectScorer wrap model inference. The pipeline only
// sees these traits, so tests swap in the deterministic mocks from `testing`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// SentimentClassifier
// ---------------------------------------------------------------------------

/// Top label reported by a classifier, in its own vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSentiment {
    pub label: String,
    pub confidence: f64,
}

impl RawSentiment {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify many texts. Order-preserving, exactly one result per input.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawSentiment>>;

    async fn classify(&self, text: &str) -> Result<RawSentiment> {
        let mut results = self.classify_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| anyhow!("classifier returned no result for one input"))
    }

    /// Full label set the classifier can emit, when known. Read after the
    /// first batch so adapters can report what the backend actually returned.
    fn label_vocabulary(&self) -> Option<Vec<String>> {
        None
    }
}

// ---------------------------------------------------------------------------
// AspectScorer
// ---------------------------------------------------------------------------

/// `(candidate, score)` for every candidate, scores independent in [0, 1].
pub type AspectScores = Vec<(String, f64)>;

#[async_trait]
pub trait AspectScorer: Send + Sync {
    async fn score(&self, sentence: &str, candidates: &[String]) -> Result<AspectScores>;

    /// Score several sentences. Order-preserving. Adapters with a batched
    /// backend override this; the default issues one call per sentence.
    async fn score_batch(
        &self,
        sentences: &[String],
        candidates: &[String],
    ) -> Result<Vec<AspectScores>> {
        let mut out = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            out.push(self.score(sentence, candidates).await?);
        }
        Ok(out)
    }
}
