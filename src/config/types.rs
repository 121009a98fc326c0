use serde::Deserialize;

/// Main crawl configuration
///
/// All fields default sensibly, so `CrawlConfig::default()` and an empty
/// TOML file both describe a small, polite crawl: depth 1, ten pages,
/// two concurrent fetches, no robots/sitemap/state features enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Maximum link-hops from the seed URL
    pub max_depth: u32,

    /// Stop after accepting this many pages
    pub max_pages: usize,

    /// Number of scrape operations dispatched per batch
    pub concurrency: usize,

    /// Concurrent request cap per host; defaults to `concurrency` when unset
    pub per_host_concurrency: Option<usize>,

    /// Minimum milliseconds between request starts against the same host
    pub min_delay_ms: u64,

    /// Substring allow-list on absolute URLs; empty admits everything
    pub include_patterns: Vec<String>,

    /// Substring deny-list on absolute URLs
    pub exclude_patterns: Vec<String>,

    /// User-agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout for page fetches (milliseconds)
    pub request_timeout_ms: u64,

    pub robots: RobotsConfig,

    pub sitemap: SitemapConfig,

    pub crawl_state: StateConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_pages: 10,
            concurrency: 2,
            per_host_concurrency: None,
            min_delay_ms: 0,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            user_agent: format!("linkwake/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_ms: 30_000,
            robots: RobotsConfig::default(),
            sitemap: SitemapConfig::default(),
            crawl_state: StateConfig::default(),
        }
    }
}

impl CrawlConfig {
    /// Per-host concurrency cap, falling back to the batch width
    pub fn effective_per_host_concurrency(&self) -> usize {
        self.per_host_concurrency.unwrap_or(self.concurrency).max(1)
    }
}

/// Robots.txt compliance configuration (opt-in)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RobotsConfig {
    /// Whether to fetch robots.txt and honor its Allow/Disallow rules
    pub enabled: bool,

    /// Crawler name matched against robots.txt User-agent sections
    pub user_agent: String,

    /// Whether a robots Crawl-delay may raise the per-host delay floor
    pub respect_crawl_delay: bool,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_agent: "linkwake".to_string(),
            respect_crawl_delay: true,
        }
    }
}

/// Sitemap seeding configuration (opt-in)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SitemapConfig {
    /// Whether to seed the frontier from `{origin}/sitemap.xml`
    pub enabled: bool,

    /// Cap on the number of sitemap URLs taken as seeds
    pub max_urls: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_urls: 50,
        }
    }
}

/// Durable crawl state configuration (opt-in)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StateConfig {
    /// Whether to persist crawl state snapshots to disk
    pub enabled: bool,

    /// Directory holding one `{id}.json` snapshot per crawl
    pub dir: String,

    /// Crawl identifier; defaults to a hash of the start URL when unset
    pub id: Option<String>,

    /// Whether to hydrate from an existing snapshot at crawl start
    pub resume: bool,

    /// Flush the snapshot every N completed batches
    pub flush_every: usize,

    /// Whether accepted pages and errors are carried in the snapshot
    pub persist_pages: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: "./crawl-state".to_string(),
            id: None,
            resume: true,
            flush_every: 5,
            persist_pages: false,
        }
    }
}
