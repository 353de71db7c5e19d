//! Tokenizer and normalizer shared by the embedder, the scorers and the
//! evaluation metrics.
//!
//! Tokens are maximal runs of `[a-z0-9]` after lowercasing. Content-bearing
//! tokens additionally drop a small English stop-word list.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[a-z0-9]+").expect("token pattern is valid")
});

/// Words ignored when comparing content-bearing tokens.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "of", "to", "and", "for", "in", "on", "with", "by", "be",
    "as", "at", "or", "that", "this",
];

/// Returns true if `token` is on the stop-word list.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercase `text` and extract every alphanumeric token, in order.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Like [`normalize_tokens`] but with stop words removed. Repeats are kept.
pub fn content_tokens(text: &str) -> Vec<String> {
    normalize_tokens(text)
        .into_iter()
        .filter(|t| !is_stopword(t))
        .collect()
}

/// Distinct content-bearing tokens of `text`.
pub fn content_token_set(text: &str) -> HashSet<String> {
    content_tokens(text).into_iter().collect()
}

/// Round `value` to `digits` decimal places.
///
/// Rounds the exact binary value, with ties going to the even digit, so
/// `round_to(0.03125, 4)` is `0.0312`.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let prec = digits.max(0) as usize;
    format!("{value:.prec$}").parse().unwrap_or(value)
}
