// Aspect assignment.
//
// Two interchangeable strategies behind AspectAssigner:
// - ZeroShotAssigner: delegates to an AspectScorer, keeps scores >= threshold
// - KeywordAssigner: whole-word, case-insensitive lexicon match, confidence 1.0
//
// Both emit assignments in sentence order, then candidate order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use review_radar_common::{AspectAssignment, AspectMethod, Sentence};

use crate::traits::AspectScorer;

#[async_trait]
pub trait AspectAssigner: Send + Sync {
    async fn assign(
        &self,
        sentences: &[Sentence],
        candidates: &[String],
    ) -> Result<Vec<AspectAssignment>>;

    fn method(&self) -> AspectMethod;
}

// ---------------------------------------------------------------------------
// Keyword lexicon
// ---------------------------------------------------------------------------

const DEFAULT_LEXICON: &[(&str, &[&str])] = &[
    ("battery", &["battery", "batt", "charge", "charging", "battery life"]),
    ("screen", &["screen", "display", "resolution", "touchscreen"]),
    ("camera", &["camera", "photo", "picture", "selfie"]),
    ("sound", &["sound", "speaker", "audio", "volume", "earphone"]),
    ("connectivity", &["bluetooth", "wifi", "connection", "connectivity", "usb"]),
    ("performance", &["speed", "slow", "fast", "lag", "performance", "fps"]),
    ("design", &["design", "look", "feel", "build", "appearance"]),
    ("quality", &["quality", "durable", "durability", "material"]),
    ("price", &["price", "cost", "expensive", "cheap", "value"]),
    ("customer service", &["customer service", "support", "warranty", "help"]),
    ("durability", &["durability", "durable", "break", "crack"]),
    ("shipping", &["shipping", "delivery", "shipped", "arrived", "package"]),
];

/// Trigger phrases per aspect. Keys are matched case-insensitively, with
/// `_` and ` ` treated alike, so `customer_service` finds `customer service`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordLexicon {
    entries: HashMap<String, Vec<String>>,
}

impl KeywordLexicon {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut lexicon = Self::default();
        for (aspect, keywords) in DEFAULT_LEXICON {
            lexicon.insert(aspect, keywords.iter().map(|k| k.to_string()).collect());
        }
        lexicon
    }

    pub fn insert(&mut self, aspect: &str, keywords: Vec<String>) {
        self.entries.insert(lexicon_key(aspect), keywords);
    }

    /// Triggers for `aspect`: its configured keywords plus the aspect name.
    pub fn triggers(&self, aspect: &str) -> Vec<String> {
        let name = aspect.trim().to_lowercase();
        let mut triggers: Vec<String> = self
            .entries
            .get(&lexicon_key(aspect))
            .map(|kws| kws.iter().map(|k| k.trim().to_lowercase()).collect())
            .unwrap_or_default();
        if !name.is_empty() && !triggers.contains(&name) {
            triggers.push(name);
        }
        triggers.retain(|t| !t.is_empty());
        triggers
    }
}

/// Normalised aspect name: trimmed, lower-case, `_` read as a space.
pub(crate) fn lexicon_key(aspect: &str) -> String {
    aspect.trim().to_lowercase().replace('_', " ")
}

// ---------------------------------------------------------------------------
// KeywordAssigner
// ---------------------------------------------------------------------------

/// Matchers are compiled once per aspect and reused for every later review.
pub struct KeywordAssigner {
    lexicon: KeywordLexicon,
    compiled: Mutex<HashMap<String, Option<Regex>>>,
}

impl KeywordAssigner {
    pub fn new(lexicon: KeywordLexicon) -> Self {
        Self {
            lexicon,
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Number of aspects with a compiled (or known-empty) matcher.
    pub fn compiled_aspects(&self) -> usize {
        self.compiled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cached_matcher(&self, aspect: &str) -> Result<Option<Regex>> {
        let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(matcher) = compiled.get(aspect) {
            return Ok(matcher.clone());
        }
        let matcher = self.matcher(aspect)?;
        compiled.insert(aspect.to_string(), matcher.clone());
        Ok(matcher)
    }

    fn matcher(&self, aspect: &str) -> Result<Option<Regex>> {
        let triggers = self.lexicon.triggers(aspect);
        if triggers.is_empty() {
            return Ok(None);
        }
        let alternation = triggers
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)\b(?:{alternation})\b");
        Regex::new(&pattern)
            .map(Some)
            .with_context(|| format!("invalid keyword pattern for aspect '{aspect}'"))
    }
}

impl Default for KeywordAssigner {
    fn default() -> Self {
        Self::new(KeywordLexicon::with_defaults())
    }
}

#[async_trait]
impl AspectAssigner for KeywordAssigner {
    async fn assign(
        &self,
        sentences: &[Sentence],
        candidates: &[String],
    ) -> Result<Vec<AspectAssignment>> {
        let mut matchers = Vec::with_capacity(candidates.len());
        for aspect in candidates {
            if let Some(re) = self.cached_matcher(aspect)? {
                matchers.push((aspect, re));
            }
        }

        let mut assignments = Vec::new();
        for sentence in sentences {
            for (aspect, re) in &matchers {
                if re.is_match(&sentence.text) {
                    assignments.push(AspectAssignment {
                        aspect: (*aspect).clone(),
                        sentence: sentence.clone(),
                        confidence: 1.0,
                    });
                }
            }
        }
        Ok(assignments)
    }

    fn method(&self) -> AspectMethod {
        AspectMethod::Keywords
    }
}

// ---------------------------------------------------------------------------
// ZeroShotAssigner
// ---------------------------------------------------------------------------

pub struct ZeroShotAssigner {
    scorer: Arc<dyn AspectScorer>,
    threshold: f64,
    batch_size: usize,
}

impl ZeroShotAssigner {
    pub fn new(scorer: Arc<dyn AspectScorer>, threshold: f64, batch_size: usize) -> Self {
        Self {
            scorer,
            threshold,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl AspectAssigner for ZeroShotAssigner {
    async fn assign(
        &self,
        sentences: &[Sentence],
        candidates: &[String],
    ) -> Result<Vec<AspectAssignment>> {
        if sentences.is_empty() || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut assignments = Vec::new();
        for chunk in sentences.chunks(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(|s| s.text.clone()).collect();
            let scored = self.scorer.score_batch(&texts, candidates).await?;
            anyhow::ensure!(
                scored.len() == chunk.len(),
                "aspect scorer returned {} results for {} sentences",
                scored.len(),
                chunk.len()
            );

            for (sentence, scores) in chunk.iter().zip(scored) {
                let by_label: HashMap<&str, f64> =
                    scores.iter().map(|(l, s)| (l.as_str(), *s)).collect();
                for aspect in candidates {
                    let Some(score) = by_label.get(aspect.as_str()).copied() else {
                        debug!(aspect = aspect.as_str(), "Scorer omitted candidate");
                        continue;
                    };
                    if score >= self.threshold {
                        assignments.push(AspectAssignment {
                            aspect: aspect.clone(),
                            sentence: sentence.clone(),
                            confidence: score.clamp(0.0, 1.0),
                        });
                    }
                }
            }
        }
        Ok(assignments)
    }

    fn method(&self) -> AspectMethod {
        AspectMethod::ZeroShot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubAspectScorer;

    fn aspects(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sentence(text: &str) -> Sentence {
        Sentence::new(text, 1)
    }

    #[tokio::test]
    async fn keyword_match_is_whole_word_and_case_insensitive() {
        let assigner = KeywordAssigner::default();
        let sentences = vec![
            sentence("The BATTERY died."),
            sentence("Batteryless design."),
            sentence("Charging is quick."),
        ];
        let out = assigner
            .assign(&sentences, &aspects(&["battery"]))
            .await
            .unwrap();

        let texts: Vec<&str> = out.iter().map(|a| a.sentence.text.as_str()).collect();
        assert_eq!(texts, vec!["The BATTERY died.", "Charging is quick."]);
        assert!(out.iter().all(|a| a.confidence == 1.0));
    }

    #[tokio::test]
    async fn multi_word_triggers_match() {
        let assigner = KeywordAssigner::default();
        let out = assigner
            .assign(
                &[sentence("Terrible customer service.")],
                &aspects(&["customer service"]),
            )
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].aspect, "customer service");
    }

    #[tokio::test]
    async fn matchers_are_compiled_once_per_aspect() {
        let assigner = KeywordAssigner::default();
        let candidates = aspects(&["battery", "screen", "no such aspect word"]);
        assert_eq!(assigner.compiled_aspects(), 0);

        let first = assigner
            .assign(&[sentence("Battery is fine.")], &candidates)
            .await
            .unwrap();
        assert_eq!(assigner.compiled_aspects(), 3);

        for _ in 0..5 {
            let again = assigner
                .assign(&[sentence("Battery is fine.")], &candidates)
                .await
                .unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(assigner.compiled_aspects(), 3);
    }

    #[tokio::test]
    async fn sentence_can_match_several_aspects() {
        let assigner = KeywordAssigner::default();
        let out = assigner
            .assign(
                &[sentence("Great screen but the price is steep.")],
                &aspects(&["screen", "price", "camera"]),
            )
            .await
            .unwrap();
        let hit: Vec<&str> = out.iter().map(|a| a.aspect.as_str()).collect();
        assert_eq!(hit, vec!["screen", "price"]);
    }

    #[tokio::test]
    async fn unknown_aspect_uses_its_own_name() {
        let assigner = KeywordAssigner::new(KeywordLexicon::empty());
        let out = assigner
            .assign(&[sentence("The hinge feels loose.")], &aspects(&["hinge"]))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn lexicon_keys_ignore_underscores() {
        let lexicon = KeywordLexicon::with_defaults();
        assert!(lexicon
            .triggers("customer_service")
            .contains(&"warranty".to_string()));
    }

    #[tokio::test]
    async fn zero_shot_applies_threshold_inclusively() {
        let scorer = StubAspectScorer::new()
            .on("Battery drains fast.", "battery", 0.35)
            .on("Battery drains fast.", "screen", 0.34)
            .on("Battery drains fast.", "price", 0.9);
        let assigner = ZeroShotAssigner::new(Arc::new(scorer), 0.35, 2);

        let out = assigner
            .assign(
                &[sentence("Battery drains fast.")],
                &aspects(&["battery", "screen", "price"]),
            )
            .await
            .unwrap();

        let hit: Vec<(&str, f64)> = out
            .iter()
            .map(|a| (a.aspect.as_str(), a.confidence))
            .collect();
        assert_eq!(hit, vec![("battery", 0.35), ("price", 0.9)]);
    }

    #[tokio::test]
    async fn zero_shot_batches_sentences() {
        let scorer = Arc::new(
            StubAspectScorer::new()
                .on("a.", "x", 0.9)
                .on("b.", "x", 0.1)
                .on("c.", "x", 0.8),
        );
        let assigner = ZeroShotAssigner::new(scorer.clone(), 0.5, 2);
        let out = assigner
            .assign(
                &[sentence("a."), sentence("b."), sentence("c.")],
                &aspects(&["x"]),
            )
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(scorer.batch_calls(), 2);
    }

    #[tokio::test]
    async fn zero_shot_with_no_candidates_skips_scorer() {
        let scorer = Arc::new(StubAspectScorer::new());
        let assigner = ZeroShotAssigner::new(scorer.clone(), 0.35, 4);
        let out = assigner.assign(&[sentence("x.")], &[]).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(scorer.batch_calls(), 0);
    }
}
