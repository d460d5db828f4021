//! ReviewScraper against an in-memory site.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use review_radar_common::ReviewRadarError;
use review_radar_scraper::{PageFetcher, ReviewScraper, ReviewSource};

/// Serves canned pages keyed by URL and records every page request.
#[derive(Default)]
struct StaticSite {
    pages: HashMap<String, String>,
    robots: Option<String>,
    robots_fails: bool,
    requested: Mutex<Vec<String>>,
}

impl StaticSite {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn robots(mut self, body: &str) -> Self {
        self.robots = Some(body.to_string());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticSite {
    async fn rendered_html(&self, url: &str) -> anyhow::Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused for {url}"))
    }

    async fn robots_txt(&self, _robots_url: &str) -> anyhow::Result<Option<String>> {
        if self.robots_fails {
            return Err(anyhow!("timeout"));
        }
        Ok(self.robots.clone())
    }
}

/// Lets a test keep a handle on the site after handing it to the scraper.
struct Shared(Arc<StaticSite>);

#[async_trait]
impl PageFetcher for Shared {
    async fn rendered_html(&self, url: &str) -> anyhow::Result<String> {
        self.0.rendered_html(url).await
    }

    async fn robots_txt(&self, robots_url: &str) -> anyhow::Result<Option<String>> {
        self.0.robots_txt(robots_url).await
    }
}

fn amazon_page(reviews: &[&str], next: Option<&str>) -> String {
    let mut html = String::from("<html><body>");
    for review in reviews {
        html.push_str(&format!(
            r#"<div data-hook="review"><span data-hook="review-body"><span>{review}</span></span></div>"#
        ));
    }
    if let Some(next) = next {
        html.push_str(&format!(r#"<ul><li class="a-last"><a href="{next}">Next</a></li></ul>"#));
    }
    html.push_str("</body></html>");
    html
}

const PAGE_1: &str = "https://www.amazon.com/product-reviews/B01?pageNumber=1";
const PAGE_2: &str = "https://www.amazon.com/product-reviews/B01?pageNumber=2";

fn two_page_site() -> StaticSite {
    StaticSite::default()
        .page(
            PAGE_1,
            &amazon_page(&["Great battery.", "Bad   screen."], Some("?pageNumber=2")),
        )
        .page(PAGE_2, &amazon_page(&["Great battery.", "Fast shipping."], None))
}

#[tokio::test]
async fn follows_pagination_and_deduplicates() {
    let scraper = ReviewScraper::new(two_page_site());
    let reviews = scraper.fetch(PAGE_1, 10).await.unwrap();
    assert_eq!(reviews, vec!["Great battery.", "Bad screen.", "Fast shipping."]);
}

#[tokio::test]
async fn stops_at_max_count() {
    let site = two_page_site();
    let scraper = ReviewScraper::new(site);
    let reviews = scraper.fetch(PAGE_1, 2).await.unwrap();
    assert_eq!(reviews, vec!["Great battery.", "Bad screen."]);
}

#[tokio::test]
async fn max_count_stops_page_requests() {
    let site = Arc::new(two_page_site());
    let scraper = ReviewScraper::new(Shared(site.clone()));
    scraper.fetch(PAGE_1, 2).await.unwrap();
    assert_eq!(site.requested(), vec![PAGE_1]);
}

#[tokio::test]
async fn robots_disallow_blocks_scrape() {
    let site = two_page_site().robots("User-agent: *\nDisallow: /product-reviews/\n");
    let scraper = ReviewScraper::new(site);
    let err = scraper.fetch(PAGE_1, 10).await.unwrap_err();
    assert!(matches!(err, ReviewRadarError::ScrapeDisallowed(_)));
    assert_eq!(err.code(), "scrape_disallowed");
}

#[tokio::test]
async fn unreachable_robots_does_not_block() {
    let mut site = two_page_site();
    site.robots_fails = true;
    let scraper = ReviewScraper::new(site);
    assert_eq!(scraper.fetch(PAGE_1, 10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn page_without_reviews_is_not_found() {
    let site = StaticSite::default().page(PAGE_1, "<html><body>Nothing</body></html>");
    let err = ReviewScraper::new(site).fetch(PAGE_1, 10).await.unwrap_err();
    assert_eq!(err.code(), "no_reviews_found");
}

#[tokio::test]
async fn follows_see_all_reviews_link_once() {
    let product = "https://www.amazon.com/dp/B01";
    let site = StaticSite::default()
        .page(
            product,
            r#"<a data-hook="see-all-reviews-link-foot" href="/product-reviews/B01?pageNumber=1">See all</a>"#,
        )
        .page(PAGE_1, &amazon_page(&["Worth it."], None));
    let scraper = ReviewScraper::new(site);
    let reviews = scraper.fetch(product, 5).await.unwrap();
    assert_eq!(reviews, vec!["Worth it."]);
}

#[tokio::test]
async fn pagination_loop_terminates() {
    let site = StaticSite::default().page(
        PAGE_1,
        &amazon_page(&["Loop."], Some("?pageNumber=1")),
    );
    let scraper = ReviewScraper::new(site);
    assert_eq!(scraper.fetch(PAGE_1, 10).await.unwrap(), vec!["Loop."]);
}

#[tokio::test]
async fn unsupported_site_is_a_scrape_failure() {
    let site = StaticSite::default();
    let err = ReviewScraper::new(site)
        .fetch("https://shop.example.com/item/1", 5)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "scrape_failed");
}

#[tokio::test]
async fn invalid_arguments_fail_before_fetching() {
    let site = two_page_site();
    let scraper = ReviewScraper::new(site);
    assert_eq!(scraper.fetch("amazon.com/dp/1", 5).await.unwrap_err().code(), "scrape_failed");
    assert_eq!(scraper.fetch(PAGE_1, 0).await.unwrap_err().code(), "scrape_failed");
}

#[tokio::test]
async fn fetch_failure_is_a_scrape_failure() {
    let site = StaticSite::default();
    let scraper = ReviewScraper::new(site);
    let err = scraper.fetch(PAGE_1, 5).await.unwrap_err();
    assert!(err.is_scrape_failure());
    assert_eq!(err.code(), "scrape_failed");
}

#[tokio::test]
async fn requests_pages_in_order() {
    let site = Arc::new(two_page_site());
    let scraper = ReviewScraper::new(Shared(site.clone()));
    scraper.fetch(PAGE_1, 10).await.unwrap();
    assert_eq!(site.requested(), vec![PAGE_1, PAGE_2]);
}
