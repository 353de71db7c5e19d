//! Vector and lexical similarity scorers.

use ragscope_core::text::content_token_set;

/// Cosine similarity between two vectors.
///
/// Returns `0.0` when either vector has zero norm or the lengths differ.
/// The result is not clamped.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denom = na * nb;
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Share of the query's distinct content tokens that also appear in `content`.
///
/// Stop words are ignored on both sides. Returns `0.0` when the query has no
/// content-bearing tokens.
pub fn lexical_overlap(query: &str, content: &str) -> f64 {
    let query_tokens = content_token_set(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content_tokens = content_token_set(content);
    let overlap = query_tokens.intersection(&content_tokens).count();
    overlap as f64 / query_tokens.len() as f64
}
