use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during normalization (exact,
/// case-insensitive matches). `utm_*` is handled as a prefix separately.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid"];

/// Normalizes a URL into its canonical form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject non-HTTP(S) schemes
/// 3. Lowercase the host
/// 4. Drop default ports (80 for http, 443 for https)
/// 5. Remove the fragment
/// 6. Remove tracking query parameters (`utm_*` prefix plus a fixed list)
/// 7. Sort remaining query parameters by key for stable ordering
/// 8. Strip a single trailing slash from multi-segment paths (root `/` kept)
///
/// The result is idempotent: normalizing an already-normalized URL is a
/// no-op.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Canonical URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use linkwake::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM:443/docs/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Lowercase the host
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            url.set_host(Some(&lowered))
                .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        }
    } else {
        return Err(UrlError::MissingHost);
    }

    // Drop default ports. The url crate already omits a port equal to the
    // scheme default, so clearing any remaining explicit default is enough.
    let default_port = match url.scheme() {
        "http" => 80,
        _ => 443,
    };
    if url.port() == Some(default_port) {
        url.set_port(None)
            .map_err(|_| UrlError::Malformed("Failed to clear port".to_string()))?;
    }

    url.set_fragment(None);

    // Filter tracking parameters and sort the remainder
    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            // query_pairs() decoded the pairs, so each key and value must
            // be re-encoded before serialization
            let query = params
                .iter()
                .map(|(k, v)| {
                    let key = encode_component(k);
                    if v.is_empty() {
                        key
                    } else {
                        format!("{}={}", key, encode_component(v))
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    // Strip a single trailing slash from multi-segment paths
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}

/// Checks whether a string is a parsable http(s) URL
///
/// This is a filter predicate, not a validator: it never errors, it just
/// answers yes or no.
pub fn is_http_url(url_str: &str) -> bool {
    match Url::parse(url_str) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

/// Filters out tracking parameters and sorts remaining query parameters by key
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

/// Checks if a query parameter key is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let lowered = key.to_lowercase();
    lowered.starts_with("utm_") || TRACKING_PARAMS.contains(&lowered.as_str())
}

/// Percent-encodes one decoded query key or value
fn encode_component(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes()).collect()
}
