//! End-to-end crawl tests
//!
//! Orchestrator-level properties run against scraper stubs (no network);
//! robots, sitemap, and redirect behavior run against wiremock servers
//! with the default HTTP scraper.

use async_trait::async_trait;
use linkwake::config::CrawlConfig;
use linkwake::crawler::{Crawler, PageMetadata, ScrapedPage, Scraper};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scraper stub serving a fixed URL -> page map; unknown URLs fail soft
struct StubScraper {
    pages: HashMap<String, ScrapedPage>,
    calls: Mutex<Vec<String>>,
}

impl StubScraper {
    fn new(pages: Vec<ScrapedPage>) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.into_iter().map(|p| (p.url.clone(), p)).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scraper for StubScraper {
    async fn scrape(&self, url: &str) -> ScrapedPage {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| ScrapedPage::failure(url, Some(404), "HTTP 404"))
    }
}

fn page(url: &str, links: &[&str]) -> ScrapedPage {
    ScrapedPage {
        url: url.to_string(),
        content: format!("content of {}", url),
        title: Some(url.to_string()),
        links: links.iter().map(|l| l.to_string()).collect(),
        metadata: PageMetadata {
            status: Some(200),
            error: None,
        },
    }
}

fn crawler(config: CrawlConfig, scraper: Arc<dyn Scraper>) -> Crawler {
    Crawler::with_scraper(config, scraper).expect("failed to build crawler")
}

#[tokio::test]
async fn test_diamond_graph_visits_shared_target_once() {
    // A and B both link to C; C must be scraped exactly once
    let stub = StubScraper::new(vec![
        page(
            "https://site.test/",
            &["https://site.test/a", "https://site.test/b"],
        ),
        page("https://site.test/a", &["https://site.test/c"]),
        page("https://site.test/b", &["https://site.test/c"]),
        page("https://site.test/c", &[]),
    ]);

    let mut config = CrawlConfig::default();
    config.max_depth = 2;
    let result = crawler(config, stub.clone()).crawl("https://site.test/").await;

    assert_eq!(result.total_pages, 4);
    let c_calls = stub
        .calls()
        .iter()
        .filter(|u| u.as_str() == "https://site.test/c")
        .count();
    assert_eq!(c_calls, 1);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_depth_bound_drops_distant_pages() {
    // / -> /a -> /b -> /c; with max_depth 1 only / and /a are visited
    let stub = StubScraper::new(vec![
        page("https://site.test/", &["https://site.test/a"]),
        page("https://site.test/a", &["https://site.test/b"]),
        page("https://site.test/b", &["https://site.test/c"]),
        page("https://site.test/c", &[]),
    ]);

    let mut config = CrawlConfig::default();
    config.max_depth = 1;
    let result = crawler(config, stub.clone()).crawl("https://site.test/").await;

    assert_eq!(result.total_pages, 2);
    assert_eq!(result.max_depth_reached, 1);
    assert!(!stub.calls().iter().any(|u| u.contains("/b")));
}

/// Scraper whose every page links to a fresh URL, an unbounded frontier
struct FountainScraper {
    counter: AtomicUsize,
}

#[async_trait]
impl Scraper for FountainScraper {
    async fn scrape(&self, url: &str) -> ScrapedPage {
        let next = self.counter.fetch_add(1, Ordering::SeqCst);
        page(url, &[&format!("https://site.test/gen/{}", next)])
    }
}

#[tokio::test]
async fn test_page_budget_terminates_infinite_frontier() {
    let mut config = CrawlConfig::default();
    config.max_depth = 1_000_000;
    config.max_pages = 5;

    let scraper = Arc::new(FountainScraper {
        counter: AtomicUsize::new(0),
    });
    let result = crawler(config, scraper).crawl("https://site.test/").await;

    assert_eq!(result.total_pages, 5);
}

#[tokio::test]
async fn test_budget_never_exceeded_with_wide_batches() {
    let links: Vec<String> = (0..20)
        .map(|i| format!("https://site.test/p{}", i))
        .collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let mut pages = vec![page("https://site.test/", &link_refs)];
    for link in &links {
        pages.push(page(link, &[]));
    }
    let stub = StubScraper::new(pages);

    let mut config = CrawlConfig::default();
    config.concurrency = 8;
    config.max_pages = 7;
    let result = crawler(config, stub).crawl("https://site.test/").await;

    assert!(result.total_pages <= 7);
}

#[tokio::test]
async fn test_scenario_duplicate_links_ordered_bfs() {
    // Seed links /a and /b, each listed twice; exactly 3 pages in order
    let stub = StubScraper::new(vec![
        page(
            "https://docs.example.com/",
            &[
                "https://docs.example.com/a",
                "https://docs.example.com/b",
                "https://docs.example.com/a",
                "https://docs.example.com/b",
            ],
        ),
        page("https://docs.example.com/a", &[]),
        page("https://docs.example.com/b", &[]),
    ]);

    let mut config = CrawlConfig::default();
    config.max_depth = 2;
    config.concurrency = 3;
    let result = crawler(config, stub.clone())
        .crawl("https://docs.example.com/")
        .await;

    assert_eq!(result.total_pages, 3);
    let urls: Vec<&str> = result.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://docs.example.com/",
            "https://docs.example.com/a",
            "https://docs.example.com/b",
        ]
    );
    // No duplicate scrape calls
    assert_eq!(stub.calls().len(), 3);
}

#[tokio::test]
async fn test_per_host_throttling_through_orchestrator() {
    struct GaugeScraper {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Scraper for GaugeScraper {
        async fn scrape(&self, url: &str) -> ScrapedPage {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(15)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            page(url, &[])
        }
    }

    let gauge = Arc::new(GaugeScraper {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    // The seed page fans out to ten same-host children; the gauge measures
    // how many child scrapes overlap
    struct SeedThenGauge {
        seed_links: Vec<String>,
        gauge: Arc<GaugeScraper>,
    }

    #[async_trait]
    impl Scraper for SeedThenGauge {
        async fn scrape(&self, url: &str) -> ScrapedPage {
            if url == "https://site.test/" {
                let refs: Vec<&str> = self.seed_links.iter().map(String::as_str).collect();
                page(url, &refs)
            } else {
                self.gauge.scrape(url).await
            }
        }
    }

    let mut config = CrawlConfig::default();
    config.concurrency = 10;
    config.per_host_concurrency = Some(2);
    config.max_pages = 20;

    let scraper = Arc::new(SeedThenGauge {
        seed_links: (0..10).map(|i| format!("https://site.test/p{}", i)).collect(),
        gauge: gauge.clone(),
    });
    let result = crawler(config, scraper).crawl("https://site.test/").await;

    assert_eq!(result.total_pages, 11);
    assert!(
        gauge.peak.load(Ordering::SeqCst) <= 2,
        "observed {} concurrent same-host scrapes",
        gauge.peak.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_resume_does_not_redispatch_visited() {
    let state_dir = tempfile::TempDir::new().unwrap();

    let site = vec![
        page(
            "https://site.test/",
            &["https://site.test/a", "https://site.test/b"],
        ),
        page("https://site.test/a", &[]),
        page("https://site.test/b", &[]),
    ];

    let mut config = CrawlConfig::default();
    config.max_depth = 2;
    config.max_pages = 1;
    config.crawl_state.enabled = true;
    config.crawl_state.dir = state_dir.path().to_string_lossy().to_string();
    config.crawl_state.persist_pages = true;

    // First run: budget 1, accepts only the root, persists /a and /b queued
    let stub1 = StubScraper::new(site.clone());
    let result1 = crawler(config.clone(), stub1.clone())
        .crawl("https://site.test/")
        .await;
    assert_eq!(result1.total_pages, 1);

    // Second run with a higher budget: root must not be scraped again
    let mut config2 = config.clone();
    config2.max_pages = 3;
    let stub2 = StubScraper::new(site);
    let result2 = crawler(config2, stub2.clone())
        .crawl("https://site.test/")
        .await;

    assert_eq!(result2.total_pages, 3);
    assert!(
        !stub2
            .calls()
            .iter()
            .any(|u| u.as_str() == "https://site.test/"),
        "root URL was re-dispatched after resume"
    );
}

#[tokio::test]
async fn test_fresh_run_ignores_persisted_state() {
    let state_dir = tempfile::TempDir::new().unwrap();

    let site = vec![page("https://site.test/", &[])];

    let mut config = CrawlConfig::default();
    config.crawl_state.enabled = true;
    config.crawl_state.dir = state_dir.path().to_string_lossy().to_string();
    config.crawl_state.persist_pages = true;

    let stub1 = StubScraper::new(site.clone());
    crawler(config.clone(), stub1).crawl("https://site.test/").await;

    // resume = false: the snapshot is ignored and the root scraped again
    let mut config2 = config.clone();
    config2.crawl_state.resume = false;
    let stub2 = StubScraper::new(site);
    let result = crawler(config2, stub2.clone())
        .crawl("https://site.test/")
        .await;

    assert_eq!(result.total_pages, 1);
    assert_eq!(stub2.calls().len(), 1);
}

// ---- wiremock-backed tests using the default HTTP scraper ----

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_robots_enforcement_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;

    mount_html(
        &server,
        "/",
        format!(
            r#"<html><body><a href="{base}/private">P</a><a href="{base}/public">Q</a></body></html>"#
        ),
    )
    .await;
    mount_html(&server, "/private", "<html><body>secret</body></html>".into()).await;
    mount_html(&server, "/public", "<html><body>open</body></html>".into()).await;

    let mut config = CrawlConfig::default();
    config.max_depth = 1;
    config.robots.enabled = true;

    let result = Crawler::new(config).unwrap().crawl(&format!("{}/", base)).await;

    let urls: Vec<&str> = result.pages.iter().map(|p| p.url.as_str()).collect();
    assert!(urls.iter().any(|u| u.contains("/public")));
    assert!(
        !urls.iter().any(|u| u.contains("/private")),
        "robots-disallowed page was fetched"
    );
}

#[tokio::test]
async fn test_robots_disabled_by_default() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;

    mount_html(
        &server,
        "/",
        format!(r#"<html><body><a href="{base}/private">P</a></body></html>"#),
    )
    .await;
    mount_html(&server, "/private", "<html><body>secret</body></html>".into()).await;

    let mut config = CrawlConfig::default();
    config.max_depth = 1;

    let result = Crawler::new(config).unwrap().crawl(&format!("{}/", base)).await;
    assert!(result.pages.iter().any(|p| p.url.contains("/private")));
}

#[tokio::test]
async fn test_redirect_convergence_single_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/home"))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/home",
        format!(r#"<html><body><a href="{base}/home">self</a></body></html>"#),
    )
    .await;

    let mut config = CrawlConfig::default();
    config.max_depth = 2;

    let result = Crawler::new(config).unwrap().crawl(&format!("{}/", base)).await;

    // Exactly one page for the redirect target, not two
    assert_eq!(result.total_pages, 1);
    assert!(result.pages[0].url.ends_with("/home"));
}

#[tokio::test]
async fn test_sitemap_seeding_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/s1</loc></url><url><loc>{base}/s2</loc></url></urlset>"
        )))
        .mount(&server)
        .await;

    mount_html(&server, "/", "<html><body>root</body></html>".into()).await;
    mount_html(&server, "/s1", "<html><body>one</body></html>".into()).await;
    mount_html(&server, "/s2", "<html><body>two</body></html>".into()).await;

    let mut config = CrawlConfig::default();
    config.sitemap.enabled = true;

    let result = Crawler::new(config).unwrap().crawl(&format!("{}/", base)).await;

    assert_eq!(result.total_pages, 3);
    let urls: Vec<&str> = result.pages.iter().map(|p| p.url.as_str()).collect();
    assert!(urls.iter().any(|u| u.ends_with("/s1")));
    assert!(urls.iter().any(|u| u.ends_with("/s2")));
}

#[tokio::test]
async fn test_sitemap_failure_is_soft() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No sitemap mock: the request 404s and seeding is skipped
    mount_html(&server, "/", "<html><body>root</body></html>".into()).await;

    let mut config = CrawlConfig::default();
    config.sitemap.enabled = true;

    let result = Crawler::new(config).unwrap().crawl(&format!("{}/", base)).await;
    assert_eq!(result.total_pages, 1);
    assert!(result.errors.is_empty());
}
