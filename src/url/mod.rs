//! URL canonicalization and filtering
//!
//! Canonical URLs are the dedup keys for the whole crawl: the frontier,
//! the visited set, and the persisted state all store URLs produced by
//! [`normalize_url`].

mod matcher;
mod normalize;

pub use matcher::matches_patterns;
pub use normalize::{is_http_url, normalize_url};

use url::Url;

/// Returns the origin key (scheme + host + explicit non-default port) for a URL.
///
/// Two URLs belong to the same crawl scope exactly when their origin keys
/// are equal. Default ports are omitted so `https://site:443/` and
/// `https://site/` share one origin.
///
/// # Examples
///
/// ```
/// use linkwake::url_origin;
/// use url::Url;
///
/// let url = Url::parse("https://docs.example.com/guide?x=1").unwrap();
/// assert_eq!(url_origin(&url), "https://docs.example.com");
/// ```
pub fn url_origin(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// Returns the host component used as the throttling key.
///
/// Ports are included so two servers on the same hostname are throttled
/// independently.
pub fn host_key(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
