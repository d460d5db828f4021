pub mod error;
pub mod types;

pub use error::{InferenceError, Result};
pub use types::{LabelScore, ZeroShotOutput};

use std::time::Duration;

use types::{
    parse_classification, parse_zero_shot, ClassificationParameters, ClassificationRequest,
    RequestOptions, ZeroShotParameters, ZeroShotRequest,
};

pub struct InferenceClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl InferenceClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    /// Classify a batch of texts. Returns every class per input, highest score first.
    pub async fn classify(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<LabelScore>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = ClassificationRequest {
            inputs: texts,
            parameters: ClassificationParameters {
                top_k: None,
                truncation: true,
            },
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let value = self.post_model(model, &body).await?;
        let mut results = parse_classification(value, texts.len())?;
        for scores in &mut results {
            scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        tracing::debug!(model, inputs = texts.len(), "Classification batch complete");
        Ok(results)
    }

    /// Score every sequence against every candidate label independently (multi-label).
    pub async fn zero_shot(
        &self,
        model: &str,
        sequences: &[String],
        candidate_labels: &[String],
    ) -> Result<Vec<ZeroShotOutput>> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let body = ZeroShotRequest {
            inputs: sequences,
            parameters: ZeroShotParameters {
                candidate_labels,
                multi_label: true,
            },
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let value = self.post_model(model, &body).await?;
        let outputs = parse_zero_shot(value, sequences.len())?;
        tracing::debug!(model, inputs = sequences.len(), "Zero-shot batch complete");
        Ok(outputs)
    }

    async fn post_model<B: serde::Serialize>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<serde_json::Value> {
        let endpoint = format!("{}/models/{}", self.base_url, model);

        let mut req = self.client.post(&endpoint).json(body);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = InferenceClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn empty_batches_skip_the_network() {
        let client = InferenceClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(client.classify("m", &[]).await.unwrap().is_empty());
        assert!(client
            .zero_shot("m", &[], &["battery".to_string()])
            .await
            .unwrap()
            .is_empty());
    }
}
