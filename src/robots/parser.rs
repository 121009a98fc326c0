//! Robots.txt parser
//!
//! Line-oriented parsing into User-agent sections, then selection of the
//! single best-matching section for this crawler. Path matching is
//! longest-prefix-wins across the combined Allow and Disallow rules.

use url::Url;

/// Rules extracted from robots.txt for the best-matching User-agent section
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRuleSet {
    /// Path prefixes this crawler must not fetch
    pub disallow: Vec<String>,

    /// Path prefixes explicitly allowed (override shorter Disallow rules)
    pub allow: Vec<String>,

    /// Crawl-delay converted to milliseconds, when present
    pub crawl_delay_ms: Option<u64>,

    /// The origin the rules were fetched from; URLs on any other origin
    /// are rejected outright
    pub origin: String,
}

/// One User-agent section during parsing
#[derive(Debug, Default)]
struct Section {
    agents: Vec<String>,
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay: Option<f64>,
}

impl Section {
    fn has_rules(&self) -> bool {
        !self.allow.is_empty() || !self.disallow.is_empty()
    }
}

/// Parses robots.txt content and selects the rules for `crawler_name`
///
/// # Section Grouping
///
/// Directives are grouped under one or more `User-agent` lines. A
/// `User-agent` line starts a new section only if the current section
/// already holds at least one Allow or Disallow rule, so consecutive
/// `User-agent` lines merge into a single section's agent list.
///
/// # Section Selection
///
/// A section whose agent list contains a case-insensitive substring match
/// against `crawler_name` is preferred over a wildcard (`*`) section.
/// Within each preference class the first section in document order wins.
///
/// # Arguments
///
/// * `content` - Raw robots.txt text
/// * `crawler_name` - The crawler name to match sections against
/// * `origin` - Origin the robots.txt was fetched from
pub fn parse_robots(content: &str, crawler_name: &str, origin: &str) -> RobotsRuleSet {
    let sections = split_sections(content);

    let name = crawler_name.to_lowercase();
    let named = sections
        .iter()
        .find(|s| s.agents.iter().any(|a| a != "*" && name.contains(a.as_str())));
    let wildcard = sections.iter().find(|s| s.agents.iter().any(|a| a == "*"));

    let selected = named.or(wildcard);

    match selected {
        Some(section) => RobotsRuleSet {
            disallow: section.disallow.clone(),
            allow: section.allow.clone(),
            crawl_delay_ms: section
                .crawl_delay
                .map(|seconds| (seconds * 1000.0) as u64),
            origin: origin.to_string(),
        },
        None => RobotsRuleSet {
            disallow: Vec::new(),
            allow: Vec::new(),
            crawl_delay_ms: None,
            origin: origin.to_string(),
        },
    }
}

/// Splits robots.txt content into User-agent sections
fn split_sections(content: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section::default();

    for line in content.lines() {
        // Strip inline comments, then whitespace
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                // A User-agent line opens a new section only once the
                // current one carries rules; otherwise it joins the
                // current section's agent list.
                if current.has_rules() {
                    sections.push(current);
                    current = Section::default();
                }
                current.agents.push(value.to_lowercase());
            }
            "allow" => {
                if !value.is_empty() {
                    current.allow.push(value.to_string());
                }
            }
            "disallow" => {
                // An empty Disallow means "allow everything" and adds no rule
                if !value.is_empty() {
                    current.disallow.push(value.to_string());
                }
            }
            "crawl-delay" => {
                if let Ok(delay) = value.parse::<f64>() {
                    if delay >= 0.0 {
                        current.crawl_delay = Some(delay);
                    }
                }
            }
            _ => {}
        }
    }

    if !current.agents.is_empty() {
        sections.push(current);
    }

    sections
}

impl RobotsRuleSet {
    /// A rule set that permits everything on the given origin
    pub fn allow_all(origin: &str) -> Self {
        Self {
            disallow: Vec::new(),
            allow: Vec::new(),
            crawl_delay_ms: None,
            origin: origin.to_string(),
        }
    }

    /// Checks whether a URL may be fetched under these rules
    ///
    /// URLs on a different origin than the robots.txt are rejected. On the
    /// matching origin, the Allow or Disallow rule with the longest prefix
    /// match against the path governs; a tie or no match defaults to
    /// allowed.
    pub fn is_allowed(&self, url: &Url) -> bool {
        if crate::url::url_origin(url) != self.origin {
            return false;
        }

        let path = url.path();

        let best_allow = longest_prefix_len(&self.allow, path);
        let best_disallow = longest_prefix_len(&self.disallow, path);

        best_disallow <= best_allow
    }
}

/// Length of the longest rule that is a prefix of `path`, or 0 if none match
fn longest_prefix_len(rules: &[String], path: &str) -> usize {
    rules
        .iter()
        .filter(|rule| path.starts_with(rule.as_str()))
        .map(|rule| rule.len())
        .max()
        .unwrap_or(0)
}
