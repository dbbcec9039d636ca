//! URL canonicalization for duplicate detection.

use std::sync::LazyLock;

use regex::Regex;
use url::{Url, form_urlencoded};

/// Query parameters that only carry campaign or click tracking.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "fbclid",
    "gclid",
    "yclid",
    "ysclid",
];

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("valid regex"));

/// Canonical form of an http(s) URL, or `None` if it cannot be parsed or
/// uses another scheme.
///
/// - scheme and host lowercased, default port dropped
/// - fragment removed
/// - tracking parameters removed, the rest sorted by key (stable)
/// - repeated slashes collapsed, trailing slash removed except for `/`
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let mut path = REPEATED_SLASHES.replace_all(url.path(), "/").into_owned();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let mut normalized = format!("{}{}", url.origin().ascii_serialization(), path);
    if !params.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&params)
            .finish();
        normalized.push('?');
        normalized.push_str(&query);
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_params_and_fragment_removed() {
        assert_eq!(
            normalize_url("https://example.com/a?utm_source=x&id=5#section").as_deref(),
            Some("https://example.com/a?id=5")
        );
        assert_eq!(
            normalize_url("https://example.com/a?fbclid=abc").as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn params_sorted_by_key() {
        assert_eq!(
            normalize_url("https://example.com/p?b=2&a=1&c=3").as_deref(),
            Some("https://example.com/p?a=1&b=2&c=3")
        );
    }

    #[test]
    fn host_case_and_slashes() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM//news///Item/").as_deref(),
            Some("https://example.com/news/Item")
        );
        assert_eq!(
            normalize_url("https://example.com/").as_deref(),
            Some("https://example.com/")
        );
        assert_eq!(
            normalize_url("https://example.com:443/x").as_deref(),
            Some("https://example.com/x")
        );
    }

    #[test]
    fn equivalent_urls_match() {
        let a = normalize_url("https://example.com/story?id=1&utm_medium=social");
        let b = normalize_url("https://EXAMPLE.com/story/?id=1#comments");
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn unsupported_or_invalid() {
        assert_eq!(normalize_url("ftp://example.com/file"), None);
        assert_eq!(normalize_url("not a url"), None);
        assert_eq!(normalize_url(""), None);
    }
}
