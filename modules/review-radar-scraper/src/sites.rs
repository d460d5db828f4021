//! Per-site selectors and page extraction.

use scraper::{Html, Selector};
use url::Url;

/// Where reviews live on one retailer's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    pub name: &'static str,
    /// Review containers, tried in order until one matches.
    pub review_selectors: &'static [&'static str],
    /// Review body inside a container.
    pub text_selector: &'static str,
    pub next_page_selector: &'static str,
    /// Link from a product page to its dedicated reviews page.
    pub all_reviews_selector: &'static str,
}

pub const AMAZON: SiteProfile = SiteProfile {
    name: "amazon",
    review_selectors: &[
        r#"[data-hook="review"]"#,
        "div.a-section.review.aok-relative",
        r#"div[id^="customer_review-"]"#,
    ],
    text_selector: r#"[data-hook="review-body"] span"#,
    next_page_selector: "li.a-last a",
    all_reviews_selector: r#"[data-hook="see-all-reviews-link-foot"]"#,
};

pub const FLIPKART: SiteProfile = SiteProfile {
    name: "flipkart",
    review_selectors: &["div._27M-vq"],
    text_selector: "div.t-ZTKy div div",
    next_page_selector: "a._1LKTO3",
    all_reviews_selector: "div._3UAT2v._16PBlm a",
};

/// Profile for a retailer host, matched on the host name.
pub fn profile_for(host: &str) -> Option<SiteProfile> {
    let host = host.to_ascii_lowercase();
    if host.contains("amazon") {
        Some(AMAZON)
    } else if host.contains("flipkart") {
        Some(FLIPKART)
    } else {
        None
    }
}

/// What one page yielded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageExtract {
    pub reviews: Vec<String>,
    pub next_page: Option<String>,
    pub all_reviews: Option<String>,
}

/// Pull review bodies and navigation links out of a rendered page. Links are
/// resolved against `page_url`.
pub fn extract_page(html: &str, profile: &SiteProfile, page_url: &Url) -> PageExtract {
    let document = Html::parse_document(html);

    let mut reviews = Vec::new();
    if let Some(text_selector) = selector(profile.text_selector) {
        for container in profile.review_selectors.iter().filter_map(|s| selector(s)) {
            let elements: Vec<_> = document.select(&container).collect();
            if elements.is_empty() {
                continue;
            }
            for element in elements {
                let Some(body) = element.select(&text_selector).next() else {
                    continue;
                };
                let text = collapse_whitespace(&body.text().collect::<String>());
                if !text.is_empty() {
                    reviews.push(text);
                }
            }
            break;
        }
    }

    PageExtract {
        reviews,
        next_page: last_link(&document, profile.next_page_selector, page_url),
        all_reviews: last_link(&document, profile.all_reviews_selector, page_url),
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn last_link(document: &Html, css: &str, base: &Url) -> Option<String> {
    let selector = selector(css)?;
    let href = document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:"))
        .last()?;
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMAZON_PAGE: &str = r#"
        <html><body>
          <div id="cm_cr-review_list">
            <div data-hook="review">
              <span data-hook="review-body"><span>  Battery life is
                 amazing.  </span></span>
            </div>
            <div data-hook="review">
              <span data-hook="review-body"><span>Screen cracked.</span></span>
            </div>
            <div data-hook="review"><span>no body here</span></div>
          </div>
          <ul class="a-pagination">
            <li class="a-last"><a href="/product-reviews/B01?pageNumber=2">Next page</a></li>
          </ul>
        </body></html>
    "#;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn hosts_map_to_profiles() {
        assert_eq!(profile_for("www.amazon.in"), Some(AMAZON));
        assert_eq!(profile_for("WWW.FLIPKART.COM"), Some(FLIPKART));
        assert_eq!(profile_for("example.com"), None);
    }

    #[test]
    fn extracts_amazon_reviews_and_next_link() {
        let page = extract_page(
            AMAZON_PAGE,
            &AMAZON,
            &url("https://www.amazon.com/product-reviews/B01"),
        );
        assert_eq!(page.reviews, vec!["Battery life is amazing.", "Screen cracked."]);
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://www.amazon.com/product-reviews/B01?pageNumber=2")
        );
        assert!(page.all_reviews.is_none());
    }

    #[test]
    fn falls_back_to_later_container_selectors() {
        let html = r#"
            <div class="a-section review aok-relative">
              <div data-hook="review-body"><span>Solid build.</span></div>
            </div>"#;
        let page = extract_page(html, &AMAZON, &url("https://amazon.com/dp/X"));
        assert_eq!(page.reviews, vec!["Solid build."]);
    }

    #[test]
    fn extracts_flipkart_reviews() {
        let html = r#"
            <div class="_27M-vq"><div class="t-ZTKy"><div><div>Value for money</div></div></div></div>
            <div class="_27M-vq"><div class="t-ZTKy"><div><div>Slow delivery</div></div></div></div>
            <a class="_1LKTO3" href="?page=1">Previous</a>
            <a class="_1LKTO3" href="?page=3">Next</a>"#;
        let page = extract_page(html, &FLIPKART, &url("https://www.flipkart.com/x/product-reviews/1?page=2"));
        assert_eq!(page.reviews, vec!["Value for money", "Slow delivery"]);
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://www.flipkart.com/x/product-reviews/1?page=3")
        );
    }

    #[test]
    fn page_without_reviews_is_empty() {
        let page = extract_page("<html></html>", &AMAZON, &url("https://amazon.com/"));
        assert_eq!(page, PageExtract::default());
    }
}
