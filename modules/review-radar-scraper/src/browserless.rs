use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use review_radar_common::ScraperConfig;

use crate::PageFetcher;

/// Rendered pages come from Browserless `/content`; `robots.txt` is fetched
/// directly since it never needs JavaScript.
pub struct BrowserlessFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    pub fn from_config(config: &ScraperConfig, timeout: Duration) -> Result<Self> {
        Self::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            timeout,
        )
    }

    fn content_endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn rendered_html(&self, url: &str) -> Result<String> {
        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(self.content_endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Browserless request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            bail!("Browserless returned status {}: {message}", status.as_u16());
        }

        let html = resp.text().await.context("Failed to read Browserless body")?;
        debug!(url, bytes = html.len(), "Rendered page fetched");
        Ok(html)
    }

    async fn robots_txt(&self, robots_url: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(robots_url)
            .send()
            .await
            .context("robots.txt request failed")?;

        // A missing robots.txt places no restrictions.
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(Some(resp.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_passed_as_query() {
        let fetcher =
            BrowserlessFetcher::new("http://browserless:3000/", Some("abc"), Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            fetcher.content_endpoint(),
            "http://browserless:3000/content?token=abc"
        );
    }

    #[test]
    fn no_token_no_query() {
        let fetcher =
            BrowserlessFetcher::new("http://browserless:3000", None, Duration::from_secs(5))
                .unwrap();
        assert_eq!(fetcher.content_endpoint(), "http://browserless:3000/content");
    }
}
