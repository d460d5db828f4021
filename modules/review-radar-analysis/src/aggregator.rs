//! Per-aspect and overall aggregation.
//!
//! Aspect scores are double-averaged: sentences are first averaged within a
//! review, then the review-local means are averaged across reviews, so a
//! review that mentions an aspect ten times still counts once. Label counts
//! stay at sentence granularity.

use std::cmp::Ordering;
use std::collections::HashMap;

use review_radar_common::{
    AspectAssignment, AuthenticityMetrics, AverageConfidence, CategoryStats, KeywordWeight,
    SentimentCounts, SentimentDistribution, SentimentLabel, SentimentResult,
};

use crate::stars::to_stars;

/// One assignment with its resolved sentence sentiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMention {
    pub aspect: String,
    pub sentence: String,
    pub sentiment: SentimentResult,
}

impl ScoredMention {
    pub fn new(assignment: &AspectAssignment, sentiment: SentimentResult) -> Self {
        Self {
            aspect: assignment.aspect.clone(),
            sentence: assignment.sentence.text.clone(),
            sentiment,
        }
    }
}

/// All of one review's mentions of one aspect, with their review-local mean.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectGroup {
    pub aspect: String,
    pub sentences: Vec<String>,
    pub local_mean: f64,
}

// ---------------------------------------------------------------------------
// CategoryAggregator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CategoryAccumulator {
    review_means: Vec<f64>,
    counts: SentimentCounts,
    // (confidence, encounter index, sentence)
    positive: Vec<(f64, usize, String)>,
    negative: Vec<(f64, usize, String)>,
}

pub struct CategoryAggregator {
    order: Vec<String>,
    example_limit: usize,
    categories: HashMap<String, CategoryAccumulator>,
    encountered: usize,
}

impl CategoryAggregator {
    /// `candidates` fixes the tie-break order of the final category list.
    pub fn new(candidates: &[String], example_limit: usize) -> Self {
        Self {
            order: candidates.to_vec(),
            example_limit,
            categories: HashMap::new(),
            encountered: 0,
        }
    }

    /// Fold in one review. Returns its (aspect) groups in first-mention order.
    pub fn add_review(&mut self, mentions: &[ScoredMention]) -> Vec<AspectGroup> {
        let mut groups: Vec<(String, Vec<&ScoredMention>)> = Vec::new();
        for mention in mentions {
            match groups.iter_mut().find(|(aspect, _)| *aspect == mention.aspect) {
                Some((_, members)) => members.push(mention),
                None => groups.push((mention.aspect.clone(), vec![mention])),
            }
        }

        let mut out = Vec::with_capacity(groups.len());
        for (aspect, members) in groups {
            let local_mean = members.iter().map(|m| m.sentiment.signed_score).sum::<f64>()
                / members.len() as f64;

            let acc = self.categories.entry(aspect.clone()).or_default();
            acc.review_means.push(local_mean);
            for m in &members {
                acc.counts.record(m.sentiment.label);
                let example = (m.sentiment.confidence, self.encountered, m.sentence.clone());
                match m.sentiment.label {
                    SentimentLabel::Positive => acc.positive.push(example),
                    SentimentLabel::Negative => acc.negative.push(example),
                    SentimentLabel::Neutral => {}
                }
                self.encountered += 1;
            }

            out.push(AspectGroup {
                aspect,
                sentences: members.iter().map(|m| m.sentence.clone()).collect(),
                local_mean,
            });
        }
        out
    }

    /// Categories with at least one mention, most-mentioned first.
    pub fn finish(self) -> Vec<CategoryStats> {
        let limit = self.example_limit;
        let order = self.order;
        let mut stats: Vec<CategoryStats> = self
            .categories
            .into_iter()
            .filter(|(_, acc)| !acc.review_means.is_empty())
            .map(|(aspect, acc)| {
                let mean_score = mean(&acc.review_means).clamp(-1.0, 1.0);
                CategoryStats {
                    mean_score,
                    mention_count: acc.review_means.len(),
                    rating_stars: to_stars(mean_score),
                    sentiment_counts: acc.counts,
                    top_positive_examples: top_examples(acc.positive, limit),
                    top_negative_examples: top_examples(acc.negative, limit),
                    aspect,
                }
            })
            .collect();

        let rank = |aspect: &str| order.iter().position(|a| a == aspect).unwrap_or(usize::MAX);
        stats.sort_by(|a, b| {
            b.mention_count
                .cmp(&a.mention_count)
                .then_with(|| rank(&a.aspect).cmp(&rank(&b.aspect)))
                .then_with(|| a.aspect.cmp(&b.aspect))
        });
        stats
    }
}

/// Aggregate pre-resolved assignments without a running pipeline. Assignments
/// are grouped by their sentence's review id; `sentiment` resolves each one.
pub fn aggregate<F>(
    assignments: &[AspectAssignment],
    sentiment: F,
    candidates: &[String],
    example_limit: usize,
) -> Vec<CategoryStats>
where
    F: Fn(&AspectAssignment) -> SentimentResult,
{
    let mut by_review: Vec<(usize, Vec<ScoredMention>)> = Vec::new();
    for assignment in assignments {
        let mention = ScoredMention::new(assignment, sentiment(assignment));
        let review_id = assignment.sentence.review_id;
        match by_review.iter_mut().find(|(id, _)| *id == review_id) {
            Some((_, mentions)) => mentions.push(mention),
            None => by_review.push((review_id, vec![mention])),
        }
    }

    let mut aggregator = CategoryAggregator::new(candidates, example_limit);
    for (_, mentions) in &by_review {
        aggregator.add_review(mentions);
    }
    aggregator.finish()
}

// ---------------------------------------------------------------------------
// Overall
// ---------------------------------------------------------------------------

/// Whole-review sentiment: one label and one signed score per review.
#[derive(Debug, Default, Clone)]
pub struct OverallAccumulator {
    counts: SentimentCounts,
    scores: Vec<f64>,
    // Confidence sums, positive/neutral/negative.
    confidence: [f64; 3],
}

impl OverallAccumulator {
    pub fn record(&mut self, sentiment: &SentimentResult) {
        self.counts.record(sentiment.label);
        self.scores.push(sentiment.signed_score);
        self.confidence[label_slot(sentiment.label)] += sentiment.confidence;
    }

    pub fn average_confidence(&self) -> AverageConfidence {
        let average = |label: SentimentLabel| {
            let n = self.counts.get(label);
            (n > 0).then(|| self.confidence[label_slot(label)] / n as f64)
        };
        AverageConfidence {
            positive: average(SentimentLabel::Positive),
            neutral: average(SentimentLabel::Neutral),
            negative: average(SentimentLabel::Negative),
        }
    }

    pub fn counts(&self) -> SentimentCounts {
        self.counts
    }

    pub fn distribution(&self) -> SentimentDistribution {
        SentimentDistribution::from_counts(&self.counts)
    }

    pub fn n_reviews(&self) -> usize {
        self.scores.len()
    }

    pub fn mean_score(&self) -> f64 {
        mean(&self.scores).clamp(-1.0, 1.0)
    }
}

fn label_slot(label: SentimentLabel) -> usize {
    match label {
        SentimentLabel::Positive => 0,
        SentimentLabel::Neutral => 1,
        SentimentLabel::Negative => 2,
    }
}

/// Leading keywords per polarity considered for keyword diversity.
const DIVERSITY_WINDOW: usize = 10;

/// Corpus indicators for a finished run. Review length counts characters of
/// the trimmed text.
pub fn authenticity(
    review_texts: &[String],
    distribution: &SentimentDistribution,
    top_positive: &[KeywordWeight],
    top_negative: &[KeywordWeight],
    categories: &[CategoryStats],
) -> AuthenticityMetrics {
    let lengths: Vec<f64> = review_texts
        .iter()
        .map(|t| t.trim().chars().count() as f64)
        .collect();

    let fractions = [distribution.positive, distribution.neutral, distribution.negative];
    let centre = mean(&fractions);
    let sentiment_variance = fractions.iter().map(|f| (f - centre).powi(2)).sum::<f64>() / 3.0;

    let mut terms: Vec<&str> = top_positive
        .iter()
        .take(DIVERSITY_WINDOW)
        .chain(top_negative.iter().take(DIVERSITY_WINDOW))
        .map(|k| k.term.as_str())
        .collect();
    terms.sort_unstable();
    terms.dedup();

    AuthenticityMetrics {
        avg_review_length: mean(&lengths),
        sentiment_variance,
        keyword_diversity: terms.len(),
        category_coverage: categories.iter().filter(|c| c.mention_count >= 2).count(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn top_examples(mut candidates: Vec<(f64, usize, String)>, limit: usize) -> Vec<String> {
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    candidates
        .into_iter()
        .take(limit)
        .map(|(_, _, text)| text)
        .collect()
}
