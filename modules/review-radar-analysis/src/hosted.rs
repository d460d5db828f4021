// Capability adapters backed by the hosted inference endpoint.
//
// - HostedSentimentClassifier: text-classification model, top label per input
// - HostedAspectScorer: zero-shot model in multi-label mode

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use inference_client::InferenceClient;
use review_radar_common::InferenceConfig;

use crate::traits::{AspectScorer, AspectScores, RawSentiment, SentimentClassifier};

/// Build both adapters over one shared client.
pub fn from_config(
    config: &InferenceConfig,
) -> Result<(HostedSentimentClassifier, HostedAspectScorer)> {
    let client = Arc::new(
        InferenceClient::new(&config.base_url, config.token.as_deref())
            .context("Failed to build inference client")?,
    );
    let classifier = HostedSentimentClassifier::new(client.clone(), &config.sentiment_model)
        .with_declared_labels(config.sentiment_labels.clone());
    let scorer = HostedAspectScorer::new(client, &config.zsc_model);
    Ok((classifier, scorer))
}

// ---------------------------------------------------------------------------
// HostedSentimentClassifier
// ---------------------------------------------------------------------------

pub struct HostedSentimentClassifier {
    client: Arc<InferenceClient>,
    model: String,
    declared: Option<Vec<String>>,
    observed: Mutex<BTreeSet<String>>,
}

impl HostedSentimentClassifier {
    pub fn new(client: Arc<InferenceClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            declared: None,
            observed: Mutex::new(BTreeSet::new()),
        }
    }

    /// Pin the label vocabulary instead of inferring it from responses.
    pub fn with_declared_labels(mut self, labels: Option<Vec<String>>) -> Self {
        self.declared = labels;
        self
    }
}

#[async_trait]
impl SentimentClassifier for HostedSentimentClassifier {
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<RawSentiment>> {
        let scored = self
            .client
            .classify(&self.model, texts)
            .await
            .with_context(|| format!("Sentiment model {} failed", self.model))?;

        if let Ok(mut observed) = self.observed.lock() {
            for scores in &scored {
                observed.extend(scores.iter().map(|s| s.label.clone()));
            }
        }

        scored
            .into_iter()
            .map(|scores| {
                let top = scores
                    .into_iter()
                    .next()
                    .context("Sentiment model returned an empty label list")?;
                Ok(RawSentiment::new(top.label, top.score))
            })
            .collect()
    }

    fn label_vocabulary(&self) -> Option<Vec<String>> {
        if let Some(declared) = &self.declared {
            return Some(declared.clone());
        }
        let observed = self.observed.lock().ok()?;
        if observed.is_empty() {
            None
        } else {
            Some(observed.iter().cloned().collect())
        }
    }
}

// ---------------------------------------------------------------------------
// HostedAspectScorer
// ---------------------------------------------------------------------------

pub struct HostedAspectScorer {
    client: Arc<InferenceClient>,
    model: String,
}

impl HostedAspectScorer {
    pub fn new(client: Arc<InferenceClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl AspectScorer for HostedAspectScorer {
    async fn score(&self, sentence: &str, candidates: &[String]) -> Result<AspectScores> {
        let mut batch = self.score_batch(&[sentence.to_string()], candidates).await?;
        batch.pop().context("Zero-shot model returned no result")
    }

    async fn score_batch(
        &self,
        sentences: &[String],
        candidates: &[String],
    ) -> Result<Vec<AspectScores>> {
        let outputs = self
            .client
            .zero_shot(&self.model, sentences, candidates)
            .await
            .with_context(|| format!("Zero-shot model {} failed", self.model))?;

        debug!(sentences = sentences.len(), "Zero-shot scores received");

        // Re-key onto the caller's candidate order; missing labels score 0.
        Ok(outputs
            .into_iter()
            .map(|out| {
                candidates
                    .iter()
                    .map(|label| (label.clone(), out.score_for(label).unwrap_or(0.0)))
                    .collect()
            })
            .collect())
    }
}
