//! HTTP primitives
//!
//! Client construction plus a bounded GET helper used by the robots and
//! sitemap modules. Page scraping goes through the `Scraper` trait instead;
//! this helper is for small auxiliary documents where a hard byte cap and a
//! short timeout matter more than streaming.

use crate::LinkwakeError;
use reqwest::Client;
use std::time::Duration;

/// A fetched HTTP response with its body read up to a byte cap
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Content-Type header value, when present
    pub content_type: Option<String>,

    /// Response body, truncated at the caller's byte cap
    pub body: String,
}

/// Builds the shared HTTP client
///
/// Follows redirects (the final URL after redirects is part of the scrape
/// contract), negotiates gzip/brotli, and identifies itself with the
/// configured user agent.
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Total per-request timeout
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs a GET request with a per-call timeout and a response size cap
///
/// The body is read chunk by chunk and truncated once `max_bytes` have
/// accumulated, so a pathological endpoint cannot balloon memory.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Absolute URL to fetch
/// * `timeout` - Timeout for this call (overrides the client default)
/// * `max_bytes` - Hard cap on the number of body bytes read
///
/// # Returns
///
/// * `Ok(HttpResponse)` - Any HTTP response, including non-2xx statuses
/// * `Err(LinkwakeError)` - Network-level failure only
pub async fn http_get(
    client: &Client,
    url: &str,
    timeout: Duration,
    max_bytes: usize,
) -> crate::Result<HttpResponse> {
    let mut response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| LinkwakeError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|source| LinkwakeError::Http {
        url: url.to_string(),
        source,
    })? {
        let remaining = max_bytes.saturating_sub(body.len());
        if remaining == 0 {
            tracing::debug!("Truncating response body for {} at {} bytes", url, max_bytes);
            break;
        }
        body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
    }

    Ok(HttpResponse {
        status,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
