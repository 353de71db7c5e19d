//! Evaluation metrics for a single RAG interaction.
//!
//! [`evaluate`] is a pure function: the same record always yields the same
//! [`MetricSet`]. Ratios are computed at full precision and rounded to four
//! decimals only when the set is assembled.

use ragscope_core::text::{content_token_set, content_tokens, round_to};
use ragscope_core::ContextChunk;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Decimal digits kept in presented metrics.
pub const METRIC_DIGITS: i32 = 4;

/// Everything known about one query/answer interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The user question.
    pub query: String,
    /// The answer being evaluated.
    pub response_text: String,
    /// Reference answer, when the query is labeled.
    #[serde(default)]
    pub expected_answer: Option<String>,
    /// Chunks known to answer the query.
    #[serde(default)]
    pub gold_chunk_ids: Vec<i64>,
    /// Final (post-rerank) result order.
    #[serde(default)]
    pub retrieved_chunk_ids: Vec<i64>,
    /// Similarity-only result order.
    #[serde(default)]
    pub base_retrieved_chunk_ids: Vec<i64>,
    /// Chunks the response claims to rely on.
    #[serde(default)]
    pub cited_chunk_ids: Vec<i64>,
    /// Retrieved chunk contents, used for faithfulness and attribution.
    #[serde(default)]
    pub retrieved_chunks: Vec<ContextChunk>,
    /// End-to-end latency in milliseconds.
    #[serde(default)]
    pub latency_ms: f64,
}

/// The fixed metric set produced for every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// 1.0 when the final results contain a gold chunk.
    pub retrieval_hit_rate: f64,
    /// 1.0 when the similarity-only results contain a gold chunk.
    pub base_retrieval_hit_rate: f64,
    /// `final_rank - base_rank` of the first gold hit; positive means
    /// reranking pushed it down.
    pub ranking_shift: f64,
    /// Latency pass-through.
    pub latency_ms: f64,
    /// Answer-token coverage by all retrieved chunks.
    pub faithfulness: f64,
    /// Answer-token coverage by the cited chunks.
    pub citation_coverage: f64,
    /// Same value as `citation_coverage`.
    pub attribution_score: f64,
    /// `1 - attribution_score`.
    pub hallucination_rate: f64,
    /// Token overlap with the expected answer, or attribution when there is none.
    pub answer_accuracy: f64,
}

impl MetricSet {
    /// Apply `f` to every metric.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            retrieval_hit_rate: f(self.retrieval_hit_rate),
            base_retrieval_hit_rate: f(self.base_retrieval_hit_rate),
            ranking_shift: f(self.ranking_shift),
            latency_ms: f(self.latency_ms),
            faithfulness: f(self.faithfulness),
            citation_coverage: f(self.citation_coverage),
            attribution_score: f(self.attribution_score),
            hallucination_rate: f(self.hallucination_rate),
            answer_accuracy: f(self.answer_accuracy),
        }
    }

    /// Field-wise sum.
    pub fn plus(&self, other: &Self) -> Self {
        Self {
            retrieval_hit_rate: self.retrieval_hit_rate + other.retrieval_hit_rate,
            base_retrieval_hit_rate: self.base_retrieval_hit_rate + other.base_retrieval_hit_rate,
            ranking_shift: self.ranking_shift + other.ranking_shift,
            latency_ms: self.latency_ms + other.latency_ms,
            faithfulness: self.faithfulness + other.faithfulness,
            citation_coverage: self.citation_coverage + other.citation_coverage,
            attribution_score: self.attribution_score + other.attribution_score,
            hallucination_rate: self.hallucination_rate + other.hallucination_rate,
            answer_accuracy: self.answer_accuracy + other.answer_accuracy,
        }
    }

    /// Arithmetic mean of `sets`, rounded for presentation. An empty slice
    /// yields all zeros.
    pub fn mean(sets: &[MetricSet]) -> Self {
        let total = sets
            .iter()
            .fold(MetricSet::default(), |acc, m| acc.plus(m));
        let count = sets.len().max(1) as f64;
        total.map(|v| round_to(v / count, METRIC_DIGITS))
    }
}

/// 1.0 when `retrieved` contains a gold id; without gold ids, 1.0 when
/// anything was retrieved at all.
pub fn hit_rate(retrieved: &[i64], gold: &[i64]) -> f64 {
    let hit = if gold.is_empty() {
        !retrieved.is_empty()
    } else {
        let gold: HashSet<i64> = gold.iter().copied().collect();
        retrieved.iter().any(|id| gold.contains(id))
    };
    if hit {
        1.0
    } else {
        0.0
    }
}

/// 1-based position of the first gold id in `ids`.
pub fn best_rank(ids: &[i64], gold: &[i64]) -> Option<usize> {
    if ids.is_empty() || gold.is_empty() {
        return None;
    }
    let gold: HashSet<i64> = gold.iter().copied().collect();
    ids.iter().position(|id| gold.contains(id)).map(|p| p + 1)
}

/// Share of the answer's content tokens (repeats counted) that occur in
/// any of `contexts`.
///
/// An answer without content tokens is fully covered (1.0); an answer with
/// tokens but no context tokens at all is not covered (0.0).
pub fn coverage_score<'a>(answer: &str, contexts: impl IntoIterator<Item = &'a str>) -> f64 {
    let answer_tokens = content_tokens(answer);
    if answer_tokens.is_empty() {
        return 1.0;
    }

    let mut context_tokens: HashSet<String> = HashSet::new();
    for text in contexts {
        context_tokens.extend(content_tokens(text));
    }
    if context_tokens.is_empty() {
        return 0.0;
    }

    let covered = answer_tokens
        .iter()
        .filter(|t| context_tokens.contains(*t))
        .count();
    covered as f64 / answer_tokens.len() as f64
}

/// Distinct-token overlap of `answer` over the distinct content tokens of
/// `expected`. 0.0 when `expected` has no content tokens.
pub fn accuracy_proxy(answer: &str, expected: &str) -> f64 {
    let expected_tokens = content_token_set(expected);
    if expected_tokens.is_empty() {
        return 0.0;
    }
    let answer_tokens = content_token_set(answer);
    let overlap = answer_tokens.intersection(&expected_tokens).count();
    overlap as f64 / expected_tokens.len() as f64
}

/// Compute the full metric set for one interaction.
pub fn evaluate(record: &EvaluationRecord) -> MetricSet {
    let retrieval_hit_rate = hit_rate(&record.retrieved_chunk_ids, &record.gold_chunk_ids);
    let base_retrieval_hit_rate =
        hit_rate(&record.base_retrieved_chunk_ids, &record.gold_chunk_ids);

    let faithfulness = coverage_score(
        &record.response_text,
        record.retrieved_chunks.iter().map(|c| c.content.as_str()),
    );

    // Citations that point outside the retrieved set contribute no context.
    let attribution = if record.cited_chunk_ids.is_empty() {
        0.0
    } else {
        let cited: HashSet<i64> = record.cited_chunk_ids.iter().copied().collect();
        coverage_score(
            &record.response_text,
            record
                .retrieved_chunks
                .iter()
                .filter(|c| cited.contains(&c.chunk_id))
                .map(|c| c.content.as_str()),
        )
    };
    let attribution_score = round_to(attribution, METRIC_DIGITS);

    let answer_accuracy = match record.expected_answer.as_deref() {
        Some(expected) if !expected.is_empty() => {
            round_to(accuracy_proxy(&record.response_text, expected), METRIC_DIGITS)
        }
        _ => attribution_score,
    };

    let base_rank = best_rank(&record.base_retrieved_chunk_ids, &record.gold_chunk_ids);
    let final_rank = best_rank(&record.retrieved_chunk_ids, &record.gold_chunk_ids);
    let ranking_shift = match (base_rank, final_rank) {
        (Some(base), Some(fin)) => fin as f64 - base as f64,
        _ => 0.0,
    };

    MetricSet {
        retrieval_hit_rate,
        base_retrieval_hit_rate,
        ranking_shift: round_to(ranking_shift, METRIC_DIGITS),
        latency_ms: round_to(record.latency_ms, METRIC_DIGITS),
        faithfulness: round_to(faithfulness, METRIC_DIGITS),
        citation_coverage: attribution_score,
        attribution_score,
        hallucination_rate: round_to(1.0 - attribution_score, METRIC_DIGITS),
        answer_accuracy,
    }
}
