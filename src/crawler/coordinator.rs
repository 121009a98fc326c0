//! Crawl orchestration
//!
//! The [`Crawler`] owns the breadth-first crawl loop: the frontier queue,
//! the visited and queued sets, depth tracking, batch dispatch through the
//! per-host scheduler, error aggregation, and termination. All frontier
//! mutation happens on this single control loop; link harvesting only runs
//! after a batch has fully settled, so no set is ever touched concurrently.

use crate::config::CrawlConfig;
use crate::crawler::scheduler::HostScheduler;
use crate::crawler::scrape::{HttpScraper, ScrapedPage, Scraper};
use crate::crawler::{build_http_client, crawl_delay_floor};
use crate::robots::{fetch_robots, RobotsRuleSet};
use crate::sitemap::fetch_sitemap_urls;
use crate::state::{default_state_id, CrawlState, StateStore, STATE_VERSION};
use crate::url::{host_key, matches_patterns, normalize_url, url_origin};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A discovered-but-not-yet-processed URL with its hop distance from the seed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierItem {
    /// Canonical URL
    pub url: String,

    /// Link-hops from the seed (seeds are depth 0)
    pub depth: u32,
}

/// A per-page failure, keyed by the URL that was dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
    pub url: String,
    pub error: String,
}

/// Outcome of a crawl invocation
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    /// Accepted pages in acceptance order
    pub pages: Vec<ScrapedPage>,

    /// Convenience count of `pages`
    pub total_pages: usize,

    /// Deepest depth at which a page was accepted
    pub max_depth_reached: u32,

    /// Per-page failures; one entry per failed dispatch, never duplicated
    pub errors: Vec<PageError>,
}

/// Mutable state for one crawl invocation
struct CrawlRun {
    origin: String,
    start_url: String,
    robots: Option<RobotsRuleSet>,
    queue: VecDeque<FrontierItem>,
    visited: HashSet<String>,
    queued: HashSet<String>,
    pages: Vec<ScrapedPage>,
    errors: Vec<PageError>,
    max_depth_reached: u32,
}

impl CrawlRun {
    fn new(origin: String, start_url: String) -> Self {
        Self {
            origin,
            start_url,
            robots: None,
            queue: VecDeque::new(),
            visited: HashSet::new(),
            queued: HashSet::new(),
            pages: Vec::new(),
            errors: Vec::new(),
            max_depth_reached: 0,
        }
    }

    fn into_result(self) -> CrawlResult {
        CrawlResult {
            total_pages: self.pages.len(),
            max_depth_reached: self.max_depth_reached,
            pages: self.pages,
            errors: self.errors,
        }
    }
}

/// The crawl engine
pub struct Crawler {
    config: CrawlConfig,
    client: Client,
    scraper: Arc<dyn Scraper>,
}

impl Crawler {
    /// Creates a crawler using the default HTTP scraper
    pub fn new(config: CrawlConfig) -> crate::Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        let scraper = Arc::new(HttpScraper::new(client.clone()));
        Ok(Self {
            config,
            client,
            scraper,
        })
    }

    /// Creates a crawler with an injected scrape collaborator
    ///
    /// The engine does not care how results are produced (static fetch,
    /// rendered browser, a stub); robots and sitemap requests still use the
    /// internal HTTP client.
    pub fn with_scraper(config: CrawlConfig, scraper: Arc<dyn Scraper>) -> crate::Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Ok(Self {
            config,
            client,
            scraper,
        })
    }

    /// Crawls the site reachable from `start_url`
    ///
    /// Seeds the frontier with the start URL (and sitemap URLs when
    /// enabled), then repeatedly dispatches bounded batches through the
    /// per-host scheduler until the frontier is exhausted or the page
    /// budget is reached. Per-page failures land in the result's error
    /// list; only an unparsable start URL short-circuits, yielding an
    /// empty result with a single error entry.
    pub async fn crawl(&self, start_url: &str) -> CrawlResult {
        // SEEDING: an invalid seed is the one fatal error
        let start = match normalize_url(start_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Invalid start URL {}: {}", start_url, e);
                return CrawlResult {
                    pages: Vec::new(),
                    total_pages: 0,
                    max_depth_reached: 0,
                    errors: vec![PageError {
                        url: start_url.to_string(),
                        error: e.to_string(),
                    }],
                };
            }
        };

        let origin = url_origin(&start);
        let mut run = CrawlRun::new(origin.clone(), start.to_string());

        if self.config.robots.enabled {
            run.robots = fetch_robots(&self.client, &origin, &self.config.robots.user_agent).await;
            if run.robots.is_none() {
                tracing::debug!("No robots.txt for {}, allowing everything", origin);
            }
        }

        // Robots crawl-delay may raise the configured floor, never lower it
        let delay = crawl_delay_floor(&self.config, run.robots.as_ref());
        let scheduler = HostScheduler::new(self.config.effective_per_host_concurrency(), delay);

        // Durable state: hydrate before seeding so a visited seed is not
        // dispatched again
        let store = self.open_state_store(&run.start_url);
        if let Some((store, id)) = &store {
            if self.config.crawl_state.resume {
                self.hydrate(&mut run, store, id);
            }
        }

        self.try_enqueue(&mut run, start.clone(), 0);

        if self.config.sitemap.enabled {
            let seeds =
                fetch_sitemap_urls(&self.client, &origin, self.config.sitemap.max_urls).await;
            for seed in seeds {
                self.try_enqueue(&mut run, seed, 0);
            }
        }

        tracing::info!(
            "Starting crawl of {} ({} seeded, max depth {}, budget {})",
            run.start_url,
            run.queue.len(),
            self.config.max_depth,
            self.config.max_pages
        );

        // DISPATCHING ⇄ DRAINING
        let mut batches_done: usize = 0;
        while !run.queue.is_empty() && run.pages.len() < self.config.max_pages {
            let batch = self.next_batch(&mut run);
            if batch.is_empty() {
                continue;
            }

            tracing::debug!(
                "Dispatching batch of {} ({} pages so far, {} in frontier)",
                batch.len(),
                run.pages.len(),
                run.queue.len()
            );

            // All-settled join: one page's failure never aborts siblings.
            // join_all preserves input order, so result processing is
            // deterministic regardless of completion order.
            let results = join_all(batch.iter().map(|item| {
                let scraper = Arc::clone(&self.scraper);
                let scheduler = &scheduler;
                async move {
                    let host = Url::parse(&item.url)
                        .ok()
                        .map(|u| host_key(&u))
                        .unwrap_or_default();
                    scheduler.run(&host, async move { scraper.scrape(&item.url).await }).await
                }
            }))
            .await;

            for (item, page) in batch.iter().zip(results) {
                self.process_result(&mut run, item, page);
            }

            batches_done += 1;
            if let Some((store, id)) = &store {
                if batches_done % self.config.crawl_state.flush_every.max(1) == 0 {
                    self.flush_state(&run, store, id);
                }
            }
        }

        // TERMINATED: one unconditional final flush
        if let Some((store, id)) = &store {
            self.flush_state(&run, store, id);
        }

        tracing::info!(
            "Crawl finished: {} pages, {} errors, max depth {}",
            run.pages.len(),
            run.errors.len(),
            run.max_depth_reached
        );

        run.into_result()
    }

    /// Pulls up to `concurrency` admissible items off the frontier
    ///
    /// Items already visited or beyond the depth bound are silently
    /// dropped. Pulled items are visited-marked immediately so a duplicate
    /// discovery while the batch is in flight cannot re-queue them.
    fn next_batch(&self, run: &mut CrawlRun) -> Vec<FrontierItem> {
        // Never pull more items than the page budget still allows
        let budget = self.config.max_pages.saturating_sub(run.pages.len());
        let width = self.config.concurrency.min(budget);

        let mut batch = Vec::new();
        while batch.len() < width {
            let Some(item) = run.queue.pop_front() else {
                break;
            };
            run.queued.remove(&item.url);

            if run.visited.contains(&item.url) {
                continue;
            }
            if item.depth > self.config.max_depth {
                continue;
            }

            run.visited.insert(item.url.clone());
            batch.push(item);
        }
        batch
    }

    /// Folds one settled scrape into the run state
    fn process_result(&self, run: &mut CrawlRun, item: &FrontierItem, page: ScrapedPage) {
        // Redirect convergence: the final URL becomes visited too, so a
        // link to the redirect target dedups against this page
        let final_key = normalize_url(&page.url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| page.url.clone());
        run.visited.insert(final_key);

        if let Some(error) = &page.metadata.error {
            tracing::debug!("Scrape failed for {}: {}", item.url, error);
            run.errors.push(PageError {
                url: item.url.clone(),
                error: error.clone(),
            });
            return;
        }

        run.max_depth_reached = run.max_depth_reached.max(item.depth);

        // Pages at the depth bound are kept but contribute no children
        if item.depth < self.config.max_depth {
            for link in &page.links {
                let Ok(url) = normalize_url(link) else {
                    continue;
                };
                self.try_enqueue(run, url, item.depth + 1);
            }
        }

        if run.pages.len() < self.config.max_pages {
            run.pages.push(page);
        }
    }

    /// Enqueues a candidate if it dedups cleanly and passes the filter chain
    fn try_enqueue(&self, run: &mut CrawlRun, url: Url, depth: u32) -> bool {
        let key = url.to_string();
        if run.visited.contains(&key) || run.queued.contains(&key) {
            return false;
        }
        if !self.admit(run, &url) {
            return false;
        }

        run.queued.insert(key.clone());
        run.queue.push_back(FrontierItem { url: key, depth });
        true
    }

    /// The admission filter chain, cheapest checks first
    fn admit(&self, run: &CrawlRun, url: &Url) -> bool {
        if url_origin(url) != run.origin {
            return false;
        }
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        if !matches_patterns(
            url.as_str(),
            &self.config.include_patterns,
            &self.config.exclude_patterns,
        ) {
            return false;
        }
        if let Some(robots) = &run.robots {
            if !robots.is_allowed(url) {
                tracing::debug!("Robots disallows {}", url);
                return false;
            }
        }
        true
    }

    /// Opens the state store when durable state is enabled
    ///
    /// The crawl identifier is the configured id or, absent one, a hash of
    /// the canonical start URL.
    fn open_state_store(&self, start_url: &str) -> Option<(StateStore, String)> {
        if !self.config.crawl_state.enabled {
            return None;
        }
        let store = StateStore::new(self.config.crawl_state.dir.clone());
        let id = self
            .config
            .crawl_state
            .id
            .clone()
            .unwrap_or_else(|| default_state_id(start_url));
        Some((store, id))
    }

    /// Hydrates run state from a persisted snapshot, if one is usable
    fn hydrate(&self, run: &mut CrawlRun, store: &StateStore, id: &str) {
        let Some(state) = store.load(id) else {
            return;
        };

        if state.base_origin != run.origin {
            tracing::warn!(
                "Ignoring crawl state {}: origin {} does not match {}",
                id,
                state.base_origin,
                run.origin
            );
            return;
        }

        run.visited = state.visited.into_iter().collect();

        // Drop queue entries already visited: guards against a crash between
        // visited-marking and queue removal in the previous run
        run.queue = state
            .queue
            .into_iter()
            .filter(|item| !run.visited.contains(&item.url))
            .collect();
        run.queued = run.queue.iter().map(|item| item.url.clone()).collect();

        if self.config.crawl_state.persist_pages {
            run.pages = state.pages;
            run.errors = state.errors;
        }
        run.max_depth_reached = state.max_depth_reached;

        tracing::info!(
            "Resumed crawl {}: {} visited, {} queued, {} pages",
            id,
            run.visited.len(),
            run.queue.len(),
            run.pages.len()
        );
    }

    /// Writes a snapshot; persistence failures are logged and swallowed
    fn flush_state(&self, run: &CrawlRun, store: &StateStore, id: &str) {
        let mut visited: Vec<String> = run.visited.iter().cloned().collect();
        visited.sort();
        let mut queued: Vec<String> = run.queued.iter().cloned().collect();
        queued.sort();

        let state = CrawlState {
            version: STATE_VERSION,
            start_url: run.start_url.clone(),
            base_origin: run.origin.clone(),
            queue: run.queue.iter().cloned().collect(),
            visited,
            queued,
            pages: if self.config.crawl_state.persist_pages {
                run.pages.clone()
            } else {
                Vec::new()
            },
            errors: if self.config.crawl_state.persist_pages {
                run.errors.clone()
            } else {
                Vec::new()
            },
            max_depth_reached: run.max_depth_reached,
            updated_at: chrono::Utc::now(),
        };

        if let Err(e) = store.save(id, &state) {
            tracing::warn!("Failed to flush crawl state {}: {}", id, e);
        }
    }
}
