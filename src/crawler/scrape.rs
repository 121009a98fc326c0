//! The scrape operation
//!
//! [`Scraper`] is the seam between the crawl engine and whatever produces
//! page content (static fetch, rendered browser, a test stub). The
//! orchestrator only depends on the contract: `scrape` never fails for
//! ordinary HTTP or content problems, it reports them through
//! `metadata.error`. Presence of that error is the sole success/failure
//! discriminator; content emptiness is never checked.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Scrape outcome metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageMetadata {
    /// HTTP status code of the final response, when one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Failure description; `None` means the scrape succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A scraped page as consumed by the crawl engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedPage {
    /// Final URL after redirects
    pub url: String,

    /// Extracted text content
    pub content: String,

    /// Page title, when one could be extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Absolute outbound links discovered on the page
    #[serde(default)]
    pub links: Vec<String>,

    #[serde(default)]
    pub metadata: PageMetadata,
}

impl ScrapedPage {
    /// Builds a failed scrape result for a URL
    pub fn failure(url: &str, status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            content: String::new(),
            title: None,
            links: Vec::new(),
            metadata: PageMetadata {
                status,
                error: Some(error.into()),
            },
        }
    }

    /// Whether the scrape succeeded (no error recorded)
    pub fn is_success(&self) -> bool {
        self.metadata.error.is_none()
    }
}

/// The unit of work the orchestrator runs once per frontier item
///
/// Implementations must report ordinary HTTP/content failures through
/// `ScrapedPage::metadata.error` rather than panicking or returning early.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> ScrapedPage;
}

/// Default scraper: a plain HTTP GET with redirect following plus HTML
/// title/link/text extraction
pub struct HttpScraper {
    client: Client,
}

impl HttpScraper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape(&self, url: &str) -> ScrapedPage {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return ScrapedPage::failure(url, None, e.to_string());
            }
        };

        let final_url = response.url().to_string();
        let status = response.status().as_u16();

        if !response.status().is_success() {
            return ScrapedPage::failure(&final_url, Some(status), format!("HTTP {}", status));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !content_type.contains("text/html") {
            return ScrapedPage::failure(
                &final_url,
                Some(status),
                format!("Expected HTML, got {}", content_type),
            );
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return ScrapedPage::failure(&final_url, Some(status), e.to_string());
            }
        };

        let extracted = extract_page(&body, &final_url);

        ScrapedPage {
            url: final_url,
            content: extracted.text,
            title: extracted.title,
            links: extracted.links,
            metadata: PageMetadata {
                status: Some(status),
                error: None,
            },
        }
    }
}

struct ExtractedPage {
    title: Option<String>,
    links: Vec<String>,
    text: String,
}

/// Parses HTML and extracts the title, outbound links, and visible text
///
/// Link rules follow the usual crawler conventions: `a[href]` anchors
/// resolved against the final URL, skipping `download` anchors and
/// non-navigational schemes (`javascript:`, `mailto:`, `tel:`, `data:`).
fn extract_page(html: &str, base_url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let mut links = Vec::new();
    if let (Ok(selector), Some(base)) = (Selector::parse("a[href]"), base.as_ref()) {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base) {
                    links.push(absolute);
                }
            }
        }
    }

    let text = Selector::parse("body")
        .ok()
        .and_then(|selector| {
            document.select(&selector).next().map(|el| {
                el.text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
        })
        .unwrap_or_default();

    ExtractedPage { title, links, text }
}

/// Resolves an href to an absolute http(s) URL, or None if non-navigational
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    for scheme in ["javascript:", "mailto:", "tel:", "data:"] {
        if lowered.starts_with(scheme) {
            return None;
        }
    }

    let resolved = base.join(trimmed).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    Some(resolved.to_string())
}
