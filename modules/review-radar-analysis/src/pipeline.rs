//! The review analysis run.
//!
//! Order of work for one call to [`AnalysisPipeline::run`]:
//! 1. drop blank reviews, fail on an empty batch
//! 2. split every review into sentences
//! 3. assign aspects per review (bounded concurrency, merged in input order)
//! 4. resolve sentence sentiment in batches through the run's cache
//! 5. fold reviews into the category aggregator
//! 6. resolve whole-review sentiment for the overall distribution
//! 7. rank keywords of the positive and negative corpora
//!
//! Any capability failure aborts the whole run; nothing partial is returned.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, ensure};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use review_radar_common::{
    AnalysisConfig, AnalysisResult, AspectAssignment, AspectMethod, AspectScore, Grade, Result,
    Review, ReviewRadarError, ReviewRecord, Sentence, SentimentResult,
};

use crate::aggregator::{authenticity, CategoryAggregator, OverallAccumulator, ScoredMention};
use crate::aspects::{
    lexicon_key, AspectAssigner, KeywordAssigner, KeywordLexicon, ZeroShotAssigner,
};
use crate::cache::SentimentCache;
use crate::keywords::top_terms;
use crate::normalizer::{downgrade_weak, LabelNormalizer};
use crate::splitter;
use crate::stars::to_stars;
use crate::traits::{AspectScorer, SentimentClassifier};

pub struct AnalysisPipeline {
    classifier: Arc<dyn SentimentClassifier>,
    scorer: Option<Arc<dyn AspectScorer>>,
    lexicon: KeywordLexicon,
}

impl AnalysisPipeline {
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            classifier,
            scorer: None,
            lexicon: KeywordLexicon::with_defaults(),
        }
    }

    /// Required for zero-shot aspect assignment.
    pub fn with_aspect_scorer(mut self, scorer: Arc<dyn AspectScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_lexicon(mut self, lexicon: KeywordLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    fn assigner(&self, config: &AnalysisConfig) -> Result<Box<dyn AspectAssigner>> {
        match config.aspect_method {
            AspectMethod::Keywords => Ok(Box::new(KeywordAssigner::new(self.lexicon.clone()))),
            AspectMethod::ZeroShot => {
                let scorer = self.scorer.clone().ok_or_else(|| {
                    ReviewRadarError::Config(
                        "zero-shot aspect assignment needs an aspect scorer".to_string(),
                    )
                })?;
                Ok(Box::new(ZeroShotAssigner::new(
                    scorer,
                    config.zsc_threshold,
                    config.zsc_batch_size,
                )))
            }
        }
    }

    /// Analyse a batch of raw review texts against the candidate aspects.
    pub async fn run(
        &self,
        texts: &[String],
        candidates: &[String],
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult> {
        config.validate()?;

        let reviews: Vec<Review> = Review::from_texts(texts)
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .collect();
        if reviews.is_empty() {
            return Err(ReviewRadarError::Input(
                "no non-empty reviews to analyse".to_string(),
            ));
        }
        let candidates = clean_candidates(candidates);
        let assigner = self.assigner(config)?;

        info!(
            n_reviews = reviews.len(),
            candidates = candidates.len(),
            method = %config.aspect_method,
            "Starting review analysis"
        );

        // Per-review work is independent; results are merged in input order.
        let assigner = assigner.as_ref();
        let candidates_ref = candidates.as_slice();
        let split: Vec<Vec<Sentence>> = reviews
            .iter()
            .map(|review| splitter::split(review.id, &review.text))
            .collect();
        let assignments: Vec<Vec<AspectAssignment>> = stream::iter(split)
            .map(|sentences| async move { assigner.assign(&sentences, candidates_ref).await })
            .buffered(config.concurrency)
            .try_collect()
            .await
            .map_err(analysis_error)?;

        let mut sentiment = SentimentResolver::new(self.classifier.as_ref(), config);

        let sentence_texts: Vec<String> = assignments
            .iter()
            .flatten()
            .map(|a| a.sentence.text.clone())
            .collect();
        // The downgrade applies to aspect-level sentences only; the cache keeps
        // the undowngraded result in case the same text is also a whole review.
        let sentence_sentiment: Vec<SentimentResult> = sentiment
            .resolve(&sentence_texts)
            .await?
            .into_iter()
            .map(|r| downgrade_weak(r, config.neutral_downgrade_below))
            .collect();

        let mut aggregator = CategoryAggregator::new(&candidates, config.example_limit);
        let mut positive_corpus = Vec::new();
        let mut negative_corpus = Vec::new();
        let threshold = config.keyword_polarity_threshold;

        let mut per_review_scores: Vec<Vec<AspectScore>> = Vec::with_capacity(reviews.len());
        let mut resolved = sentence_sentiment.into_iter();
        for review_assignments in &assignments {
            let mentions: Vec<ScoredMention> = review_assignments
                .iter()
                .zip(resolved.by_ref())
                .map(|(assignment, result)| ScoredMention::new(assignment, result))
                .collect();

            let mut scores = Vec::new();
            for group in aggregator.add_review(&mentions) {
                scores.push(AspectScore {
                    aspect: group.aspect.clone(),
                    mean_score: group.local_mean,
                });
                if group.local_mean > threshold {
                    positive_corpus.extend(group.sentences);
                } else if group.local_mean < -threshold {
                    negative_corpus.extend(group.sentences);
                }
            }
            per_review_scores.push(scores);
        }

        let review_texts: Vec<String> = reviews.iter().map(|r| r.text.clone()).collect();
        let review_sentiment = sentiment.resolve(&review_texts).await?;

        let mut overall = OverallAccumulator::default();
        let mut records = Vec::with_capacity(reviews.len());
        for ((review, result), category_scores) in reviews
            .iter()
            .zip(&review_sentiment)
            .zip(per_review_scores)
        {
            overall.record(result);
            if result.signed_score > threshold {
                positive_corpus.push(review.text.clone());
            } else if result.signed_score < -threshold {
                negative_corpus.push(review.text.clone());
            }
            records.push(ReviewRecord {
                review_id: review.id,
                review_text: review.text.clone(),
                label: result.label,
                confidence: result.confidence,
                signed_score: result.signed_score,
                rating_stars: to_stars(result.signed_score),
                category_scores,
            });
        }

        let categories = aggregator.finish();
        let overall_score = overall.mean_score();
        let distribution = overall.distribution();
        let positive_percent = distribution.positive * 100.0;
        let top_positive = top_terms(&positive_corpus, config.keyword_top_n);
        let top_negative = top_terms(&negative_corpus, config.keyword_top_n);
        let authenticity = authenticity(
            &review_texts,
            &distribution,
            &top_positive,
            &top_negative,
            &categories,
        );

        info!(
            n_reviews = overall.n_reviews(),
            categories = categories.len(),
            classified = sentiment.classified(),
            cache_hits = sentiment.cache.hits(),
            "Analysis complete"
        );

        Ok(AnalysisResult {
            sentiment: distribution,
            counts: overall.counts(),
            n_reviews: overall.n_reviews(),
            categories,
            overall_score,
            overall_rating_stars: to_stars(overall_score),
            top_positive,
            top_negative,
            mode: config.aspect_method,
            positive_percent,
            grade: Grade::from_percent(positive_percent),
            average_confidence: overall.average_confidence(),
            authenticity,
            reviews: records,
        })
    }
}

// ---------------------------------------------------------------------------
// SentimentResolver
// ---------------------------------------------------------------------------

/// Run-scoped sentiment: batches classifier calls, normalises labels and
/// memoises results. Dropped when the run ends.
struct SentimentResolver<'a> {
    classifier: &'a dyn SentimentClassifier,
    cache: SentimentCache,
    normalizer: Option<LabelNormalizer>,
    batch_size: usize,
    classified: usize,
}

impl<'a> SentimentResolver<'a> {
    fn new(classifier: &'a dyn SentimentClassifier, config: &AnalysisConfig) -> Self {
        Self {
            classifier,
            cache: SentimentCache::new(config.cache_enabled),
            normalizer: None,
            batch_size: config.sentiment_batch_size.max(1),
            classified: 0,
        }
    }

    fn classified(&self) -> usize {
        self.classified
    }

    /// One result per input text, in order.
    async fn resolve(&mut self, texts: &[String]) -> Result<Vec<SentimentResult>> {
        let dedupe = self.cache.is_enabled();

        // Texts still to classify, and which of them each input maps to.
        let mut pending: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut slots: Vec<Option<usize>> = Vec::with_capacity(texts.len());
        for text in texts {
            if self.cache.get(text).is_some() {
                slots.push(None);
                continue;
            }
            let slot = match index.get(text.as_str()) {
                Some(&i) if dedupe => i,
                _ => {
                    pending.push(text.clone());
                    index.insert(text.as_str(), pending.len() - 1);
                    pending.len() - 1
                }
            };
            slots.push(Some(slot));
        }

        let fresh = self.classify(&pending).await?;
        let fresh = &fresh;

        let mut out = Vec::with_capacity(texts.len());
        for (text, slot) in texts.iter().zip(slots) {
            let result = self
                .cache
                .get_or_compute(text, || async move {
                    slot.and_then(|i| fresh.get(i).copied())
                        .ok_or_else(|| anyhow!("no sentiment computed for text"))
                })
                .await
                .map_err(analysis_error)?;
            out.push(result);
        }
        Ok(out)
    }

    async fn classify(&mut self, texts: &[String]) -> Result<Vec<SentimentResult>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let raw = self
                .classifier
                .classify_batch(chunk)
                .await
                .map_err(analysis_error)?;
            ensure_len(raw.len(), chunk.len())?;

            // Vocabulary is fixed from the first response for the rest of the run.
            let classifier = self.classifier;
            let normalizer = self.normalizer.get_or_insert_with(|| {
                let vocabulary = classifier.label_vocabulary();
                let normalizer = LabelNormalizer::from_vocabulary(vocabulary.as_deref());
                debug!(
                    ordinal_scheme = normalizer.ordinal_scheme(),
                    "Sentiment label vocabulary fixed"
                );
                normalizer
            });

            out.extend(raw.iter().map(|r| normalizer.to_result(r, None)));
            self.classified += chunk.len();
        }
        Ok(out)
    }
}

fn ensure_len(got: usize, expected: usize) -> Result<()> {
    let check = || -> anyhow::Result<()> {
        ensure!(
            got == expected,
            "classifier returned {got} results for {expected} texts"
        );
        Ok(())
    };
    check().map_err(analysis_error)
}

fn analysis_error(err: anyhow::Error) -> ReviewRadarError {
    ReviewRadarError::Analysis(format!("{err:#}"))
}

/// Trimmed and non-empty. Names that the lexicon reads as the same aspect
/// (case, `_` for space) collapse onto the first spelling given.
fn clean_candidates(candidates: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let candidate = candidate.trim();
        if !candidate.is_empty() && seen.insert(lexicon_key(candidate)) {
            out.push(candidate.to_string());
        }
    }
    out
}
