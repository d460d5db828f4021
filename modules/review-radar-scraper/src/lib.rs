pub mod browserless;
pub mod robots;
pub mod sites;

pub use browserless::BrowserlessFetcher;
pub use robots::RobotsRules;
pub use sites::{profile_for, SiteProfile};

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use review_radar_common::{Result, ReviewRadarError};

/// Upper bound on pages visited per scrape, whatever `max_count` asks for.
pub const MAX_PAGES: usize = 50;

// --- ReviewSource trait ---

/// Harvests raw review texts from a product URL.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// At most `max_count` distinct review texts, in page order. Fails with
    /// `ScrapeDisallowed`, `NoReviewsFound` or `Scraping`.
    async fn fetch(&self, url: &str, max_count: usize) -> Result<Vec<String>>;
}

// --- PageFetcher trait ---

/// Transport used by [`ReviewScraper`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fully rendered HTML of a page.
    async fn rendered_html(&self, url: &str) -> anyhow::Result<String>;

    /// Body of a robots.txt, or `None` when the site has none.
    async fn robots_txt(&self, robots_url: &str) -> anyhow::Result<Option<String>>;
}

// --- ReviewScraper ---

pub struct ReviewScraper<F> {
    fetcher: F,
}

impl<F: PageFetcher> ReviewScraper<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    async fn check_robots(&self, url: &Url) -> Result<()> {
        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);
        robots_url.set_fragment(None);

        let body = match self.fetcher.robots_txt(robots_url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "robots.txt unavailable, proceeding");
                None
            }
        };
        let Some(body) = body else {
            return Ok(());
        };

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        if RobotsRules::parse(&body).is_allowed(&path) {
            Ok(())
        } else {
            Err(ReviewRadarError::ScrapeDisallowed(url.to_string()))
        }
    }
}

#[async_trait]
impl<F: PageFetcher> ReviewSource for ReviewScraper<F> {
    async fn fetch(&self, url: &str, max_count: usize) -> Result<Vec<String>> {
        let start = parse_product_url(url)?;
        if max_count == 0 {
            return Err(ReviewRadarError::Scraping(
                "max_count must be greater than zero".to_string(),
            ));
        }

        let host = start.host_str().unwrap_or_default().to_string();
        let profile = profile_for(&host).ok_or_else(|| {
            ReviewRadarError::Scraping(format!("unsupported or unparseable domain: {host}"))
        })?;

        self.check_robots(&start).await?;
        info!(url, site = profile.name, max_count, "Scraping reviews");

        let mut reviews: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = Some(start.to_string());
        let mut followed_all_reviews = false;

        while let Some(page_url) = next.take() {
            if reviews.len() >= max_count || visited.len() >= MAX_PAGES {
                break;
            }
            if !visited.insert(page_url.clone()) {
                debug!(page_url, "Pagination loop detected");
                break;
            }

            let html = self
                .fetcher
                .rendered_html(&page_url)
                .await
                .map_err(|e| ReviewRadarError::Scraping(format!("{e:#}")))?;
            let base = Url::parse(&page_url)
                .map_err(|e| ReviewRadarError::Scraping(e.to_string()))?;
            let page = sites::extract_page(&html, &profile, &base);

            // Product pages often show a teaser; jump to the full list once.
            if page.reviews.is_empty() && !followed_all_reviews {
                if let Some(all) = page.all_reviews {
                    followed_all_reviews = true;
                    next = Some(all);
                    continue;
                }
            }

            let found = page.reviews.len();
            for review in page.reviews {
                if reviews.len() >= max_count {
                    break;
                }
                if seen.insert(review.clone()) {
                    reviews.push(review);
                }
            }
            debug!(page = visited.len(), found, total = reviews.len(), "Page scraped");

            if found == 0 {
                break;
            }
            next = page.next_page;
        }

        if reviews.is_empty() {
            return Err(ReviewRadarError::NoReviewsFound(url.to_string()));
        }
        reviews.truncate(max_count);
        info!(url, count = reviews.len(), pages = visited.len(), "Scrape complete");
        Ok(reviews)
    }
}

/// Accept only absolute http(s) URLs.
pub fn parse_product_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|_| ReviewRadarError::Scraping(format!("invalid URL: {url}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ReviewRadarError::Scraping(format!(
            "URL must use http or https, got {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(ReviewRadarError::Scraping(format!("URL has no host: {url}")));
    }
    Ok(parsed)
}
