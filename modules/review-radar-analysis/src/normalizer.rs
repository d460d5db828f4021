//! Raw classifier labels to canonical sentiment.
//!
//! Substring rules win over ordinal position: "neg", then "pos", then "neu",
//! all case-insensitive. Labels that match none are read as ordinal indices
//! (`LABEL_2`, `2`) and mapped by their rank among the vocabulary's indices,
//! so `LABEL_1..LABEL_3` reads the same as `LABEL_0..LABEL_2`. Anything left
//! over is neutral, never an error.

use review_radar_common::{SentimentLabel, SentimentResult};

use crate::traits::RawSentiment;

/// Ordinal indices assumed when the classifier reports no vocabulary.
const DEFAULT_ORDINAL_INDICES: [usize; 3] = [0, 1, 2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelNormalizer {
    /// Sorted, distinct indices of the vocabulary's ordinal labels.
    ordinal_indices: Vec<usize>,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self {
            ordinal_indices: DEFAULT_ORDINAL_INDICES.to_vec(),
        }
    }
}

impl LabelNormalizer {
    /// Build from the classifier's label vocabulary. Evaluated once per run.
    pub fn from_vocabulary(vocabulary: Option<&[String]>) -> Self {
        let Some(vocabulary) = vocabulary.filter(|v| !v.is_empty()) else {
            return Self::default();
        };

        let mut indices: Vec<usize> = vocabulary
            .iter()
            .filter(|label| substring_label(label).is_none())
            .filter_map(|label| ordinal_index(label))
            .collect();
        indices.sort_unstable();
        indices.dedup();

        Self {
            ordinal_indices: indices,
        }
    }

    /// Number of ordinal labels in the vocabulary.
    pub fn ordinal_scheme(&self) -> usize {
        self.ordinal_indices.len()
    }

    pub fn normalize(&self, raw_label: &str) -> SentimentLabel {
        if let Some(label) = substring_label(raw_label) {
            return label;
        }
        let position = ordinal_index(raw_label)
            .and_then(|index| self.ordinal_indices.binary_search(&index).ok());
        match (self.ordinal_indices.len(), position) {
            (3, Some(0)) => SentimentLabel::Negative,
            (3, Some(1)) => SentimentLabel::Neutral,
            (3, Some(2)) => SentimentLabel::Positive,
            (2, Some(0)) => SentimentLabel::Negative,
            (2, Some(1)) => SentimentLabel::Positive,
            _ => SentimentLabel::Neutral,
        }
    }

    /// Canonical result for one raw classification. Polar results whose
    /// confidence falls below `downgrade_below` become neutral.
    pub fn to_result(&self, raw: &RawSentiment, downgrade_below: Option<f64>) -> SentimentResult {
        let result = SentimentResult::new(self.normalize(&raw.label), raw.confidence);
        downgrade_weak(result, downgrade_below)
    }
}

/// Relabel a positive or negative result as neutral when its confidence is
/// below `threshold`. The confidence itself is kept.
pub fn downgrade_weak(result: SentimentResult, threshold: Option<f64>) -> SentimentResult {
    match threshold {
        Some(t) if result.label != SentimentLabel::Neutral && result.confidence < t => {
            SentimentResult::new(SentimentLabel::Neutral, result.confidence)
        }
        _ => result,
    }
}

pub fn to_signed_score(label: SentimentLabel, confidence: f64) -> f64 {
    SentimentResult::new(label, confidence).signed_score
}

fn substring_label(raw: &str) -> Option<SentimentLabel> {
    let lower = raw.to_lowercase();
    if lower.contains("neg") {
        Some(SentimentLabel::Negative)
    } else if lower.contains("pos") {
        Some(SentimentLabel::Positive)
    } else if lower.contains("neu") {
        Some(SentimentLabel::Neutral)
    } else {
        None
    }
}

/// Trailing decimal index of an ordinal label: `LABEL_2` -> 2, `1` -> 1.
fn ordinal_index(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    let digits_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    trimmed[digits_start..].parse().ok()
}
