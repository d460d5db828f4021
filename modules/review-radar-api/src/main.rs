use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use review_radar_analysis::{hosted, AnalysisPipeline};
use review_radar_api::{router, AppState};
use review_radar_common::{AnalysisConfig, InferenceConfig, ScraperConfig, ServiceConfig};
use review_radar_scraper::{BrowserlessFetcher, ReviewScraper};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("review_radar=info".parse()?))
        .init();

    let config = ServiceConfig::from_env()?;
    config.log_redacted();

    let inference = InferenceConfig::from_env()?;
    inference.log_redacted();
    let (classifier, scorer) = hosted::from_config(&inference)?;
    let pipeline = AnalysisPipeline::new(Arc::new(classifier)).with_aspect_scorer(Arc::new(scorer));

    let mut state = AppState::new(config.clone(), AnalysisConfig::default(), pipeline);
    match ScraperConfig::from_env() {
        Ok(scraper) => {
            let fetcher = BrowserlessFetcher::from_config(
                &scraper,
                Duration::from_secs(config.scrape_timeout_secs),
            )?;
            state = state.with_source(Arc::new(ReviewScraper::new(fetcher)));
        }
        Err(e) => warn!(error = %e, "URL scraping disabled"),
    }

    let app = router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    info!("Review Radar API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
