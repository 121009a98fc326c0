//! Robots.txt handling
//!
//! Fetches and parses robots.txt into a per-crawl rule set. Fetching is
//! soft-fail: any network, HTTP, or parse problem yields `None`, which the
//! caller treats as "everything allowed". Robots compliance may tighten the
//! per-host delay floor via `Crawl-delay`, never loosen it.

mod parser;

pub use parser::{parse_robots, RobotsRuleSet};

use crate::crawler::http_get;
use reqwest::Client;
use std::time::Duration;

/// Timeout for the robots.txt request
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Response size cap for robots.txt bodies
const ROBOTS_MAX_BYTES: usize = 512 * 1024;

/// Fetches and parses robots.txt for an origin
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - The origin (scheme://host[:port]) whose robots.txt to fetch
/// * `crawler_name` - Crawler name matched against User-agent sections
///
/// # Returns
///
/// * `Some(RobotsRuleSet)` - Parsed rules for the best-matching section
/// * `None` - robots.txt missing, unreachable, or unreadable (allow all)
pub async fn fetch_robots(
    client: &Client,
    origin: &str,
    crawler_name: &str,
) -> Option<RobotsRuleSet> {
    let robots_url = format!("{}/robots.txt", origin);

    let response = match http_get(client, &robots_url, ROBOTS_TIMEOUT, ROBOTS_MAX_BYTES).await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", origin, e);
            return None;
        }
    };

    if !(200..300).contains(&response.status) {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}, treating as allow-all",
            origin,
            response.status
        );
        return None;
    }

    // An HTML body is an error page served with a 200, not a robots file
    if response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("text/html"))
    {
        tracing::debug!(
            "robots.txt for {} served as HTML, treating as allow-all",
            origin
        );
        return None;
    }

    Some(parse_robots(&response.body, crawler_name, origin))
}
