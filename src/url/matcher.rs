/// Checks a candidate URL against include/exclude substring patterns
///
/// Patterns are plain substrings matched against the absolute URL string:
///
/// 1. If any exclude pattern matches, the URL is rejected.
/// 2. If the include list is non-empty, at least one include pattern must
///    match; an empty include list admits everything.
///
/// # Arguments
///
/// * `url` - The absolute URL string to test
/// * `include` - Substrings at least one of which must appear (if non-empty)
/// * `exclude` - Substrings none of which may appear
///
/// # Examples
///
/// ```
/// use linkwake::url::matches_patterns;
///
/// let include = vec!["/docs/".to_string()];
/// let exclude = vec!["/docs/archive/".to_string()];
///
/// assert!(matches_patterns("https://example.com/docs/intro", &include, &exclude));
/// assert!(!matches_patterns("https://example.com/blog/post", &include, &exclude));
/// assert!(!matches_patterns("https://example.com/docs/archive/old", &include, &exclude));
/// ```
pub fn matches_patterns(url: &str, include: &[String], exclude: &[String]) -> bool {
    if exclude.iter().any(|p| url.contains(p.as_str())) {
        return false;
    }

    if include.is_empty() {
        return true;
    }

    include.iter().any(|p| url.contains(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pats(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_lists_admit_everything() {
        assert!(matches_patterns("https://example.com/anything", &[], &[]));
    }

    #[test]
    fn test_include_must_match() {
        let include = pats(&["/docs/"]);
        assert!(matches_patterns("https://example.com/docs/a", &include, &[]));
        assert!(!matches_patterns("https://example.com/blog/a", &include, &[]));
    }

    #[test]
    fn test_any_include_suffices() {
        let include = pats(&["/docs/", "/api/"]);
        assert!(matches_patterns("https://example.com/api/v1", &include, &[]));
    }

    #[test]
    fn test_exclude_wins() {
        let include = pats(&["/docs/"]);
        let exclude = pats(&["/docs/private/"]);
        assert!(!matches_patterns(
            "https://example.com/docs/private/key",
            &include,
            &exclude
        ));
    }

    #[test]
    fn test_exclude_without_include() {
        let exclude = pats(&["logout"]);
        assert!(!matches_patterns("https://example.com/logout", &[], &exclude));
        assert!(matches_patterns("https://example.com/login", &[], &exclude));
    }
}
