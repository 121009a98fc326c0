//! Configuration loading and validation
//!
//! Crawl behavior is configured through a TOML file with kebab-case keys.
//! Every field carries a default so a minimal (or empty) file is valid.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{CrawlConfig, RobotsConfig, SitemapConfig, StateConfig};
pub use validation::validate;
