use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReviewRadarError>;

#[derive(Error, Debug)]
pub enum ReviewRadarError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Scraping is disallowed for this URL: {0}")]
    ScrapeDisallowed(String),

    #[error("No reviews were found on the page: {0}")]
    NoReviewsFound(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ReviewRadarError {
    /// Stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(_) => "invalid_input",
            Self::Analysis(_) => "analysis_failed",
            Self::ScrapeDisallowed(_) => "scrape_disallowed",
            Self::NoReviewsFound(_) => "no_reviews_found",
            Self::Scraping(_) => "scrape_failed",
            Self::Config(_) => "invalid_config",
            Self::JobNotFound(_) => "not_found",
            Self::Anyhow(_) => "internal_error",
        }
    }

    /// True for the scraper family of failures.
    pub fn is_scrape_failure(&self) -> bool {
        matches!(
            self,
            Self::ScrapeDisallowed(_) | Self::NoReviewsFound(_) | Self::Scraping(_)
        )
    }
}
