//! Sitemap seeding
//!
//! Optionally seeds the frontier from `{origin}/sitemap.xml`. The document
//! is scanned structurally for `<loc>` entries rather than parsed as XML,
//! so malformed sitemaps still yield whatever URLs can be salvaged. Every
//! failure here is soft: the crawl simply proceeds from the start URL.

use crate::crawler::http_get;
use crate::url::normalize_url;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Timeout for the sitemap request
const SITEMAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Response size cap for sitemap bodies
const SITEMAP_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Fetches `{origin}/sitemap.xml` and extracts candidate seed URLs
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - The origin whose sitemap to fetch
/// * `max_urls` - Cap on the number of URLs returned
///
/// # Returns
///
/// Normalized URLs in document order, at most `max_urls` of them. An
/// unreachable or non-2xx sitemap yields an empty list.
pub async fn fetch_sitemap_urls(client: &Client, origin: &str, max_urls: usize) -> Vec<Url> {
    let sitemap_url = format!("{}/sitemap.xml", origin);

    let response = match http_get(client, &sitemap_url, SITEMAP_TIMEOUT, SITEMAP_MAX_BYTES).await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("sitemap fetch failed for {}: {}", origin, e);
            return Vec::new();
        }
    };

    if !(200..300).contains(&response.status) {
        tracing::debug!(
            "sitemap for {} returned HTTP {}, seeding nothing",
            origin,
            response.status
        );
        return Vec::new();
    }

    let urls = extract_loc_urls(&response.body, max_urls);
    tracing::info!("Seeded {} URLs from {}", urls.len(), sitemap_url);
    urls
}

/// Extracts and normalizes `<loc>` text contents from sitemap XML
///
/// Tolerant structural scan: anything between a `<loc>` and the following
/// `</loc>` is taken as a URL candidate; entries that fail normalization
/// are skipped.
pub fn extract_loc_urls(body: &str, max_urls: usize) -> Vec<Url> {
    let mut urls = Vec::new();
    let mut rest = body;

    while urls.len() < max_urls {
        let Some(start) = rest.find("<loc>") else {
            break;
        };
        let after = &rest[start + "<loc>".len()..];
        let Some(end) = after.find("</loc>") else {
            break;
        };

        let candidate = after[..end].trim();
        match normalize_url(candidate) {
            Ok(url) => urls.push(url),
            Err(e) => {
                tracing::debug!("Skipping sitemap entry {:?}: {}", candidate, e);
            }
        }

        rest = &after[end + "</loc>".len()..];
    }

    urls
}
