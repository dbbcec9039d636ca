//! Text → index tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::stopwords::is_stopword;

/// Tokens must be longer than this many characters.
const MIN_TOKEN_CHARS: usize = 2;

/// Lowercase, blank out everything but ASCII word characters and Cyrillic,
/// split on whitespace, drop short tokens and stopwords.
///
/// Order follows the input and duplicates are kept; term frequencies are
/// counted downstream.
pub fn tokenize(text: &str) -> Vec<String> {
    static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"[^0-9A-Za-z_\s\x{0400}-\x{04FF}]").expect("valid regex")
    });

    let lowered = text.to_lowercase();
    let cleaned = NON_WORD_RE.replace_all(&lowered, " ");

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
        .filter(|t| !is_stopword(t))
        .map(str::to_string)
        .collect()
}
