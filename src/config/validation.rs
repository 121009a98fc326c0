use crate::config::types::CrawlConfig;
use crate::ConfigError;

/// Validates a crawl configuration
///
/// Checks the structural constraints the type system cannot express:
/// non-zero concurrency and budgets, a usable flush interval, and
/// non-empty pattern entries.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.concurrency == 0 {
        return Err(ConfigError::Validation(
            "concurrency must be at least 1".to_string(),
        ));
    }

    if let Some(per_host) = config.per_host_concurrency {
        if per_host == 0 {
            return Err(ConfigError::Validation(
                "per-host-concurrency must be at least 1".to_string(),
            ));
        }
    }

    if config.max_pages == 0 {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1".to_string(),
        ));
    }

    if config.crawl_state.enabled && config.crawl_state.flush_every == 0 {
        return Err(ConfigError::Validation(
            "crawl-state.flush-every must be at least 1".to_string(),
        ));
    }

    if config.sitemap.enabled && config.sitemap.max_urls == 0 {
        return Err(ConfigError::Validation(
            "sitemap.max-urls must be at least 1".to_string(),
        ));
    }

    for pattern in config
        .include_patterns
        .iter()
        .chain(config.exclude_patterns.iter())
    {
        if pattern.is_empty() {
            return Err(ConfigError::Validation(
                "URL patterns must not be empty strings".to_string(),
            ));
        }
    }

    if config.robots.enabled && config.robots.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "robots.user-agent must not be empty".to_string(),
        ));
    }

    Ok(())
}
