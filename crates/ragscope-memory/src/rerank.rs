//! Hybrid reranking of similarity-ordered candidates.
//!
//! The retriever over-fetches candidates from the index (see
//! [`candidate_count`]) so that the lexical signal can pull a chunk into the
//! final top-k that pure similarity would have cut.

use ragscope_core::text::round_to;
use serde::{Deserialize, Serialize};

use crate::similarity::lexical_overlap;
use crate::store::{RetrievalRow, MAX_CANDIDATES};

/// Weight of the similarity score in hybrid mode.
pub const HYBRID_BASE_WEIGHT: f64 = 0.7;
/// Weight of the lexical score in hybrid mode.
pub const HYBRID_LEXICAL_WEIGHT: f64 = 0.3;
/// Smallest number of results a retrieval returns.
pub const MIN_TOP_K: usize = 1;
/// Largest number of results a retrieval returns.
pub const MAX_TOP_K: usize = 20;
/// Decimal digits kept in presented scores.
const SCORE_DIGITS: i32 = 6;

/// Clamp a caller-supplied `top_k` into `[MIN_TOP_K, MAX_TOP_K]`.
pub fn clamp_top_k(requested: i64) -> usize {
    requested.clamp(MIN_TOP_K as i64, MAX_TOP_K as i64) as usize
}

/// How many candidates to pull from the index for a given `top_k`.
pub fn candidate_count(top_k: usize) -> usize {
    top_k.max((top_k * 3).min(MAX_CANDIDATES))
}

/// How the final score is derived from the base and lexical scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RerankMethod {
    /// `0.7 * base + 0.3 * lexical`.
    #[default]
    Hybrid,
    /// Lexical overlap only.
    Lexical,
}

impl RerankMethod {
    /// Parse a method name. Anything other than `"lexical"` means hybrid.
    pub fn parse_method(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "lexical" => RerankMethod::Lexical,
            _ => RerankMethod::Hybrid,
        }
    }

    /// The canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RerankMethod::Hybrid => "hybrid",
            RerankMethod::Lexical => "lexical",
        }
    }
}

impl From<String> for RerankMethod {
    fn from(s: String) -> Self {
        Self::parse_method(&s)
    }
}

/// Reranking switches for one retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerankOptions {
    /// When false the base similarity order is kept.
    pub enabled: bool,
    /// Scoring method when enabled.
    pub method: RerankMethod,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            method: RerankMethod::Hybrid,
        }
    }
}

impl RerankOptions {
    /// Reranking turned off; results follow similarity order.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Reranking on with the given method.
    pub fn with_method(method: RerankMethod) -> Self {
        Self {
            enabled: true,
            method,
        }
    }
}

/// A final, user-facing retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Stored chunk id.
    pub chunk_id: i64,
    /// Chunk text.
    pub content: String,
    /// Position before reranking (1-based).
    pub base_rank: usize,
    /// Similarity from the index.
    pub base_score: f64,
    /// Lexical overlap with the query.
    pub lexical_score: f64,
    /// Score used for the final order.
    pub rerank_score: f64,
    /// Position after reranking and truncation (1-based).
    pub rank: usize,
    /// Same value as `rerank_score`.
    pub score: f64,
}

/// Score `rows` against `query`, reorder them and keep the best `top_k`.
///
/// The sort is stable, so equal scores keep their similarity order. `top_k`
/// is clamped to `[1, 20]` and `rank` is assigned after truncation.
pub fn rerank(
    query: &str,
    rows: Vec<RetrievalRow>,
    top_k: usize,
    options: RerankOptions,
) -> Vec<RankedResult> {
    let top_k = top_k.clamp(MIN_TOP_K, MAX_TOP_K);

    let mut results: Vec<RankedResult> = rows
        .into_iter()
        .map(|row| {
            let lexical_score = lexical_overlap(query, &row.content);
            let rerank_score = match (options.enabled, options.method) {
                (false, _) => row.base_score,
                (true, RerankMethod::Lexical) => lexical_score,
                (true, RerankMethod::Hybrid) => {
                    HYBRID_BASE_WEIGHT * row.base_score + HYBRID_LEXICAL_WEIGHT * lexical_score
                }
            };
            let rerank_score = round_to(rerank_score, SCORE_DIGITS);
            RankedResult {
                chunk_id: row.chunk_id,
                content: row.content,
                base_rank: row.base_rank,
                base_score: round_to(row.base_score, SCORE_DIGITS),
                lexical_score: round_to(lexical_score, SCORE_DIGITS),
                rerank_score,
                rank: 0,
                score: rerank_score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.rerank_score
            .partial_cmp(&a.rerank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);
    for (idx, result) in results.iter_mut().enumerate() {
        result.rank = idx + 1;
    }
    results
}
