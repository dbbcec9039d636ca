//! Content extraction helpers shared by the built-in processors.
//!
//! - [`html_to_text`]: HTML → plain text via `scraper`
//! - [`json_to_text`]: first text-like field of a JSON payload
//! - [`normalize_url`]: canonical URLs for duplicate detection

pub mod canonical;
pub mod html;
pub mod json;

pub use canonical::{TRACKING_PARAMS, normalize_url};
pub use html::{HtmlOptions, html_to_text};
pub use json::{TEXT_KEYS, json_to_text};

/// Collapse whitespace runs (including no-break spaces) to one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapsed() {
        assert_eq!(normalize_whitespace("  a \n\t b\u{00a0}\u{00a0}c  "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
