//! The crawl engine
//!
//! This module contains the core crawling machinery:
//! - HTTP client construction and the bounded GET primitive
//! - The scrape-operation contract and its default HTTP implementation
//! - Per-host request scheduling and throttling
//! - The breadth-first crawl orchestrator

mod coordinator;
mod fetcher;
mod scheduler;
mod scrape;

pub use coordinator::{CrawlResult, Crawler, FrontierItem, PageError};
pub use fetcher::{build_http_client, http_get, HttpResponse};
pub use scheduler::HostScheduler;
pub use scrape::{HttpScraper, PageMetadata, ScrapedPage, Scraper};

use crate::config::CrawlConfig;
use crate::robots::RobotsRuleSet;
use std::time::Duration;

/// Effective per-host delay floor
///
/// The configured minimum, raised by the robots Crawl-delay when crawl-delay
/// compliance is on. Robots can tighten the floor but never loosen it.
pub fn crawl_delay_floor(config: &CrawlConfig, robots: Option<&RobotsRuleSet>) -> Duration {
    let mut delay_ms = config.min_delay_ms;
    if config.robots.respect_crawl_delay {
        if let Some(robots_ms) = robots.and_then(|r| r.crawl_delay_ms) {
            delay_ms = delay_ms.max(robots_ms);
        }
    }
    Duration::from_millis(delay_ms)
}

/// Runs a complete crawl from a start URL with the default HTTP scraper
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `start_url` - The seed URL
///
/// # Returns
///
/// * `Ok(CrawlResult)` - The crawl outcome (per-page failures inside)
/// * `Err(LinkwakeError)` - Only client construction can fail
pub async fn crawl(config: CrawlConfig, start_url: &str) -> crate::Result<CrawlResult> {
    let crawler = Crawler::new(config)?;
    Ok(crawler.crawl(start_url).await)
}
