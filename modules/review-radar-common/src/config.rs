use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ReviewRadarError};

pub const DEFAULT_ASPECTS: &[&str] = &[
    "battery",
    "screen",
    "camera",
    "performance",
    "price",
    "design",
    "customer service",
    "shipping",
    "quality",
    "features",
];

// =============================================================================
// Analysis
// =============================================================================

/// How sentences get mapped to aspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectMethod {
    /// Zero-shot scoring against the candidate list.
    #[default]
    #[serde(rename = "zsc")]
    ZeroShot,
    /// Whole-word keyword matching, no model.
    #[serde(rename = "keywords")]
    Keywords,
}

impl AspectMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroShot => "zsc",
            Self::Keywords => "keywords",
        }
    }
}

impl fmt::Display for AspectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zsc" | "zero-shot" | "zero_shot" | "zeroshot" => Ok(Self::ZeroShot),
            "keywords" | "keyword" => Ok(Self::Keywords),
            other => Err(format!("unknown aspect method '{other}' (expected zsc or keywords)")),
        }
    }
}

/// Knobs for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub aspect_method: AspectMethod,
    /// Minimum zero-shot score for an aspect assignment.
    pub zsc_threshold: f64,
    pub zsc_batch_size: usize,
    pub sentiment_batch_size: usize,
    pub cache_enabled: bool,
    pub keyword_top_n: usize,
    /// Signed score a text must exceed (in absolute value) to join a keyword corpus.
    pub keyword_polarity_threshold: f64,
    /// Example sentences kept per polarity per aspect.
    pub example_limit: usize,
    /// Positive/negative results below this confidence are relabelled neutral.
    pub neutral_downgrade_below: Option<f64>,
    /// Reviews whose aspect assignment may run concurrently.
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            aspect_method: AspectMethod::ZeroShot,
            zsc_threshold: 0.35,
            zsc_batch_size: 4,
            sentiment_batch_size: 16,
            cache_enabled: true,
            keyword_top_n: 20,
            keyword_polarity_threshold: 0.05,
            example_limit: 3,
            neutral_downgrade_below: None,
            concurrency: 4,
        }
    }
}

impl AnalysisConfig {
    pub fn keywords() -> Self {
        Self {
            aspect_method: AspectMethod::Keywords,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.zsc_threshold) {
            return Err(ReviewRadarError::Config(format!(
                "zsc_threshold must be within [0, 1], got {}",
                self.zsc_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.keyword_polarity_threshold) {
            return Err(ReviewRadarError::Config(format!(
                "keyword_polarity_threshold must be within [0, 1], got {}",
                self.keyword_polarity_threshold
            )));
        }
        if let Some(t) = self.neutral_downgrade_below {
            if !(0.0..=1.0).contains(&t) {
                return Err(ReviewRadarError::Config(format!(
                    "neutral_downgrade_below must be within [0, 1], got {t}"
                )));
            }
        }
        if self.zsc_batch_size == 0 || self.sentiment_batch_size == 0 {
            return Err(ReviewRadarError::Config(
                "batch sizes must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ReviewRadarError::Config(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// HTTP service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_reviews_default: usize,
    pub max_reviews_limit: usize,
    pub scrape_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
    /// Finished jobs are evicted this long after they complete.
    pub job_ttl_secs: u64,
    pub api_key: Option<String>,
    pub default_aspects: Vec<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enable_api_key = lookup("ENABLE_API_KEY")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let api_key = if enable_api_key {
            Some(required(&lookup, "API_KEY")?)
        } else {
            None
        };

        Ok(Self {
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8000)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            max_reviews_default: parsed(&lookup, "MAX_REVIEWS_DEFAULT", 500)?,
            max_reviews_limit: parsed(&lookup, "MAX_REVIEWS_LIMIT", 2000)?,
            scrape_timeout_secs: parsed(&lookup, "SCRAPE_TIMEOUT_SECONDS", 60)?,
            analysis_timeout_secs: parsed(&lookup, "ANALYSIS_TIMEOUT_SECONDS", 300)?,
            job_ttl_secs: parsed(&lookup, "JOB_TTL_SECONDS", 3600)?,
            api_key,
            default_aspects: lookup("DEFAULT_ASPECTS")
                .map(|v| split_list(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_aspects),
        })
    }

    /// Clamp a requested review count to the configured limit.
    pub fn clamp_max_reviews(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|n| *n > 0)
            .unwrap_or(self.max_reviews_default)
            .min(self.max_reviews_limit)
    }

    pub fn log_redacted(&self) {
        info!(
            host = self.host.as_str(),
            port = self.port,
            max_reviews_default = self.max_reviews_default,
            max_reviews_limit = self.max_reviews_limit,
            api_key_enabled = self.api_key.is_some(),
            aspects = self.default_aspects.len(),
            "Service config loaded"
        );
    }
}

// =============================================================================
// Inference / scraping backends
// =============================================================================

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub sentiment_model: String,
    pub zsc_model: String,
    /// Declared label vocabulary of the sentiment model, if known.
    pub sentiment_labels: Option<Vec<String>>,
}

impl InferenceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            base_url: required(&lookup, "INFERENCE_API_URL")?,
            token: lookup("INFERENCE_API_TOKEN").filter(|t| !t.is_empty()),
            sentiment_model: lookup("SENTIMENT_MODEL")
                .unwrap_or_else(|| "cardiffnlp/twitter-roberta-base-sentiment".to_string()),
            zsc_model: lookup("ZSC_MODEL")
                .unwrap_or_else(|| "facebook/bart-large-mnli".to_string()),
            sentiment_labels: lookup("SENTIMENT_LABELS")
                .map(|v| split_list(&v))
                .filter(|v| !v.is_empty()),
        })
    }

    pub fn log_redacted(&self) {
        info!(
            base_url = self.base_url.as_str(),
            token_set = self.token.is_some(),
            sentiment_model = self.sentiment_model.as_str(),
            zsc_model = self.zsc_model.as_str(),
            "Inference config loaded"
        );
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub browserless_url: String,
    pub browserless_token: Option<String>,
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            browserless_url: required(&lookup, "BROWSERLESS_URL")?,
            browserless_token: lookup("BROWSERLESS_TOKEN").filter(|t| !t.is_empty()),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn default_aspects() -> Vec<String> {
    DEFAULT_ASPECTS.iter().map(|s| s.to_string()).collect()
}

/// Split a comma-separated list, trimming and dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ReviewRadarError::Config(format!("{key} environment variable is required")))
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ReviewRadarError::Config(format!("{key} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}
