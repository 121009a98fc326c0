//! Linkwake command-line entry point

use anyhow::Context;
use clap::Parser;
use linkwake::config::{load_config_with_hash, CrawlConfig};
use linkwake::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Linkwake: a polite, resumable same-origin web crawler
///
/// Crawls the link graph reachable from a start URL, breadth first, under
/// concurrency and politeness constraints, and prints a summary of the
/// pages it accepted.
#[derive(Parser, Debug)]
#[command(name = "linkwake")]
#[command(version)]
#[command(about = "A polite, resumable same-origin web crawler", long_about = None)]
struct Cli {
    /// The URL to start crawling from
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Path to a TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore any persisted crawl state and start cold
    #[arg(long)]
    fresh: bool,

    /// Print the effective configuration and exit without crawling
    #[arg(long)]
    dry_run: bool,

    /// Emit the crawl result as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            tracing::info!("Loaded configuration from {} (hash: {})", path.display(), hash);
            config
        }
        None => CrawlConfig::default(),
    };

    if cli.fresh {
        config.crawl_state.resume = false;
    }

    if cli.dry_run {
        print_effective_config(&config, &cli.start_url);
        return Ok(());
    }

    let result = crawl(config, &cli.start_url).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "Crawled {} pages (max depth {}), {} errors",
        result.total_pages,
        result.max_depth_reached,
        result.errors.len()
    );
    for page in &result.pages {
        println!("  {}  {}", page.url, page.title.as_deref().unwrap_or("-"));
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {}  {}", error.url, error.error);
        }
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkwake=info,warn"),
            1 => EnvFilter::new("linkwake=debug,info"),
            2 => EnvFilter::new("linkwake=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Prints the effective configuration for --dry-run
fn print_effective_config(config: &CrawlConfig, start_url: &str) {
    println!("=== Linkwake Dry Run ===\n");
    println!("Start URL: {}", start_url);
    println!("  Max depth: {}", config.max_depth);
    println!("  Max pages: {}", config.max_pages);
    println!("  Concurrency: {}", config.concurrency);
    println!(
        "  Per-host concurrency: {}",
        config.effective_per_host_concurrency()
    );
    println!("  Min delay: {}ms", config.min_delay_ms);
    println!("  Include patterns: {:?}", config.include_patterns);
    println!("  Exclude patterns: {:?}", config.exclude_patterns);

    println!("\nRobots:");
    println!("  Enabled: {}", config.robots.enabled);
    println!("  User agent: {}", config.robots.user_agent);
    println!("  Respect crawl-delay: {}", config.robots.respect_crawl_delay);

    println!("\nSitemap:");
    println!("  Enabled: {}", config.sitemap.enabled);
    println!("  Max URLs: {}", config.sitemap.max_urls);

    println!("\nCrawl state:");
    println!("  Enabled: {}", config.crawl_state.enabled);
    println!("  Dir: {}", config.crawl_state.dir);
    println!("  Resume: {}", config.crawl_state.resume);
    println!("  Flush every: {} batches", config.crawl_state.flush_every);
    println!("  Persist pages: {}", config.crawl_state.persist_pages);

    println!("\n✓ Configuration is valid");
}
