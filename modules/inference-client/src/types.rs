use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// One class with its probability, as returned by text-classification models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Zero-shot output for one sequence. `labels[i]` scored `scores[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotOutput {
    #[serde(default)]
    pub sequence: Option<String>,
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ZeroShotOutput {
    pub fn score_for(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.scores.get(i).copied())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassificationRequest<'a> {
    pub inputs: &'a [String],
    pub parameters: ClassificationParameters,
    pub options: RequestOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassificationParameters {
    /// `None` asks the endpoint for every class.
    pub top_k: Option<u32>,
    pub truncation: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ZeroShotRequest<'a> {
    pub inputs: &'a [String],
    pub parameters: ZeroShotParameters<'a>,
    pub options: RequestOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct ZeroShotParameters<'a> {
    pub candidate_labels: &'a [String],
    pub multi_label: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestOptions {
    pub wait_for_model: bool,
}

/// Classification endpoints return `[[...], [...]]` for batches but a flat
/// `[...]` when given a single input.
pub fn parse_classification(
    value: serde_json::Value,
    expected: usize,
) -> Result<Vec<Vec<LabelScore>>> {
    let nested: Vec<Vec<LabelScore>> = match serde_json::from_value(value.clone()) {
        Ok(nested) => nested,
        Err(_) => {
            let flat: Vec<LabelScore> = serde_json::from_value(value)?;
            vec![flat]
        }
    };

    if nested.len() != expected {
        return Err(InferenceError::Shape(format!(
            "expected {expected} classification results, got {}",
            nested.len()
        )));
    }
    if let Some(pos) = nested.iter().position(|scores| scores.is_empty()) {
        return Err(InferenceError::Shape(format!(
            "classification result {pos} has no labels"
        )));
    }
    Ok(nested)
}

/// Zero-shot endpoints return a bare object for one input and an array for many.
pub fn parse_zero_shot(value: serde_json::Value, expected: usize) -> Result<Vec<ZeroShotOutput>> {
    let outputs: Vec<ZeroShotOutput> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };

    if outputs.len() != expected {
        return Err(InferenceError::Shape(format!(
            "expected {expected} zero-shot results, got {}",
            outputs.len()
        )));
    }
    for (i, out) in outputs.iter().enumerate() {
        if out.labels.len() != out.scores.len() {
            return Err(InferenceError::Shape(format!(
                "zero-shot result {i} has {} labels but {} scores",
                out.labels.len(),
                out.scores.len()
            )));
        }
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_batched_classification() {
        let value = json!([
            [{"label": "LABEL_2", "score": 0.9}, {"label": "LABEL_1", "score": 0.08}],
            [{"label": "LABEL_0", "score": 0.7}, {"label": "LABEL_1", "score": 0.2}]
        ]);
        let parsed = parse_classification(value, 2).unwrap();
        assert_eq!(parsed[0][0].label, "LABEL_2");
        assert_eq!(parsed[1][0].score, 0.7);
    }

    #[test]
    fn parses_flat_single_classification() {
        let value = json!([{"label": "POSITIVE", "score": 0.99}, {"label": "NEGATIVE", "score": 0.01}]);
        let parsed = parse_classification(value, 1).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].len(), 2);
    }

    #[test]
    fn classification_count_mismatch_is_shape_error() {
        let value = json!([[{"label": "POSITIVE", "score": 0.99}]]);
        assert!(matches!(
            parse_classification(value, 3),
            Err(InferenceError::Shape(_))
        ));
    }

    #[test]
    fn parses_single_zero_shot_object() {
        let value = json!({
            "sequence": "Battery life is amazing.",
            "labels": ["battery", "screen"],
            "scores": [0.97, 0.02]
        });
        let parsed = parse_zero_shot(value, 1).unwrap();
        assert_eq!(parsed[0].score_for("battery"), Some(0.97));
        assert_eq!(parsed[0].score_for("price"), None);
    }

    #[test]
    fn zero_shot_label_score_mismatch_is_rejected() {
        let value = json!([{"labels": ["battery", "screen"], "scores": [0.5]}]);
        assert!(parse_zero_shot(value, 1).is_err());
    }
}
