use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AspectMethod;

// =============================================================================
// Input
// =============================================================================

/// One raw review. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: usize,
    pub text: String,
}

impl Review {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// Assign 1-based ids in input order.
    pub fn from_texts<I, S>(texts: I) -> Vec<Review>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Review::new(i + 1, text))
            .collect()
    }
}

/// A sentence-like unit derived from a review. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub review_id: usize,
}

impl Sentence {
    pub fn new(text: impl Into<String>, review_id: usize) -> Self {
        Self {
            text: text.into(),
            review_id,
        }
    }
}

// =============================================================================
// Sentiment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical sentiment for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    /// +confidence, -confidence or 0 depending on `label`. Always in [-1, 1].
    pub signed_score: f64,
}

impl SentimentResult {
    pub fn new(label: SentimentLabel, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let signed_score = match label {
            SentimentLabel::Positive => confidence,
            SentimentLabel::Negative => -confidence,
            SentimentLabel::Neutral => 0.0,
        };
        Self {
            label,
            confidence,
            signed_score,
        }
    }
}

/// "This sentence is about this aspect", with the assigner's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectAssignment {
    pub aspect: String,
    pub sentence: Sentence,
    pub confidence: f64,
}

// =============================================================================
// Aggregates
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentCounts {
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Fractions of reviews per label. Sums to 1 whenever `total() > 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentDistribution {
    pub fn from_counts(counts: &SentimentCounts) -> Self {
        let total = counts.total();
        if total == 0 {
            return Self::default();
        }
        let total = total as f64;
        Self {
            positive: counts.positive as f64 / total,
            neutral: counts.neutral as f64 / total,
            negative: counts.negative as f64 / total,
        }
    }

    pub fn rounded(&self, places: u32) -> Self {
        Self {
            positive: round_to(self.positive, places),
            neutral: round_to(self.neutral, places),
            negative: round_to(self.negative, places),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub aspect: String,
    /// Mean of per-review means, in [-1, 1].
    pub mean_score: f64,
    /// Number of reviews that mentioned the aspect.
    pub mention_count: usize,
    pub rating_stars: f64,
    /// Sentence-level label counts.
    pub sentiment_counts: SentimentCounts,
    pub top_positive_examples: Vec<String>,
    pub top_negative_examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub term: String,
    pub score: f64,
}

// =============================================================================
// Verdicts and per-review records
// =============================================================================

/// Verbal verdict for a share of positive labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "Overwhelmingly Positive")]
    OverwhelminglyPositive,
    #[serde(rename = "Very Positive")]
    VeryPositive,
    #[serde(rename = "Mostly Positive")]
    MostlyPositive,
    #[serde(rename = "Positive")]
    Positive,
    #[default]
    #[serde(rename = "Mixed")]
    Mixed,
    #[serde(rename = "Mostly Negative")]
    MostlyNegative,
    #[serde(rename = "Very Negative")]
    VeryNegative,
    #[serde(rename = "Overwhelmingly Negative")]
    OverwhelminglyNegative,
}

impl Grade {
    /// `percent` is the positive share in [0, 100]. Lower bounds are inclusive.
    pub fn from_percent(percent: f64) -> Self {
        match percent {
            p if p >= 95.0 => Self::OverwhelminglyPositive,
            p if p >= 85.0 => Self::VeryPositive,
            p if p >= 70.0 => Self::MostlyPositive,
            p if p >= 60.0 => Self::Positive,
            p if p >= 40.0 => Self::Mixed,
            p if p >= 25.0 => Self::MostlyNegative,
            p if p >= 10.0 => Self::VeryNegative,
            _ => Self::OverwhelminglyNegative,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverwhelminglyPositive => "Overwhelmingly Positive",
            Self::VeryPositive => "Very Positive",
            Self::MostlyPositive => "Mostly Positive",
            Self::Positive => "Positive",
            Self::Mixed => "Mixed",
            Self::MostlyNegative => "Mostly Negative",
            Self::VeryNegative => "Very Negative",
            Self::OverwhelminglyNegative => "Overwhelmingly Negative",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean classifier confidence of the reviews given each label; `None` when
/// no review got that label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageConfidence {
    pub positive: Option<f64>,
    pub neutral: Option<f64>,
    pub negative: Option<f64>,
}

/// Review-local mean for one aspect a review mentioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectScore {
    pub aspect: String,
    pub mean_score: f64,
}

/// Whole-review outcome, one per analysed review, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: usize,
    pub review_text: String,
    pub label: SentimentLabel,
    /// Raw classifier confidence for `label`.
    pub confidence: f64,
    pub signed_score: f64,
    pub rating_stars: f64,
    /// Review-local mean per aspect mentioned, in order of first mention.
    pub category_scores: Vec<AspectScore>,
}

/// Shape-of-the-corpus indicators shown next to the sentiment breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityMetrics {
    /// Mean review length in characters.
    pub avg_review_length: f64,
    /// Population variance of the positive/neutral/negative fractions.
    pub sentiment_variance: f64,
    /// Distinct terms among the leading positive and negative keywords.
    pub keyword_diversity: usize,
    /// Categories mentioned by at least two reviews.
    pub category_coverage: usize,
}

/// Full output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentDistribution,
    pub counts: SentimentCounts,
    pub n_reviews: usize,
    pub categories: Vec<CategoryStats>,
    pub overall_score: f64,
    pub overall_rating_stars: f64,
    pub top_positive: Vec<KeywordWeight>,
    pub top_negative: Vec<KeywordWeight>,
    pub mode: AspectMethod,
    /// Share of positive reviews, in percent.
    pub positive_percent: f64,
    pub grade: Grade,
    pub average_confidence: AverageConfidence,
    pub authenticity: AuthenticityMetrics,
    pub reviews: Vec<ReviewRecord>,
}

impl AnalysisResult {
    /// The persisted/printed compatibility shape.
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            sentiment: self.sentiment.rounded(4),
            counts: self.counts,
            n_reviews: self.n_reviews,
            categories: self
                .categories
                .iter()
                .map(|c| CategorySummary {
                    category: c.aspect.clone(),
                    n_reviews: c.mention_count,
                    mean_score: round_to(c.mean_score, 4),
                    rating_stars: c.rating_stars,
                })
                .collect(),
            mode: self.mode.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub n_reviews: usize,
    pub mean_score: f64,
    pub rating_stars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub sentiment: SentimentDistribution,
    pub counts: SentimentCounts,
    pub n_reviews: usize,
    pub categories: Vec<CategorySummary>,
    pub mode: String,
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
