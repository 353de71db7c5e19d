//! Batch evaluation over a labeled dataset.

use ragscope_core::{ContextChunk, RagResult};
use ragscope_memory::{RankedResult, RerankMethod, RerankOptions, Retriever};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::generator::{AnswerGenerator, GenerateRequest};
use crate::metrics::{evaluate, EvaluationRecord, MetricSet};

/// Default result count per question.
pub const DEFAULT_TOP_K: i64 = 5;

/// One labeled question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineEvalItem {
    /// Question to retrieve and answer.
    pub question: String,
    /// Reference answer.
    pub expected_answer: String,
    /// Chunks known to answer the question.
    #[serde(default)]
    pub gold_chunk_ids: Vec<i64>,
}

/// Outcome of evaluating one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    /// The evaluated question.
    pub question: String,
    /// Generated answer.
    pub answer: String,
    /// Chunks the answer cites.
    pub cited_chunk_ids: Vec<i64>,
    /// Metrics for this item.
    pub metrics: MetricSet,
    /// Final result order.
    pub retrieved_chunk_ids: Vec<i64>,
}

/// Mean metrics plus the per-item breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Mean of every metric across items.
    pub aggregate: MetricSet,
    /// One entry per dataset item, in order.
    pub per_item: Vec<ItemResult>,
}

/// Runs retrieve, generate and evaluate for every item of a dataset.
pub struct OfflineEvaluator {
    retriever: Arc<Retriever>,
    generator: Arc<dyn AnswerGenerator>,
}

impl OfflineEvaluator {
    /// Evaluate with `retriever` and `generator`.
    pub fn new(retriever: Arc<Retriever>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Evaluate `dataset` with hybrid reranking at `top_k`.
    ///
    /// Items run sequentially. Latency covers retrieval and generation of
    /// each item. The aggregate of an empty dataset is all zeros.
    pub async fn run(&self, dataset: &[OfflineEvalItem], top_k: i64) -> RagResult<OfflineReport> {
        let options = RerankOptions::with_method(RerankMethod::Hybrid);
        let mut per_item = Vec::with_capacity(dataset.len());

        for item in dataset {
            let started = Instant::now();
            let results = self
                .retriever
                .retrieve(&item.question, top_k, options)
                .await?;
            let contexts: Vec<ContextChunk> = results
                .iter()
                .map(|r| ContextChunk::new(r.chunk_id, r.content.clone()))
                .collect();
            let generated = self
                .generator
                .generate(&GenerateRequest::new(item.question.clone(), contexts.clone()))
                .await?;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let retrieved_chunk_ids: Vec<i64> = results.iter().map(|r| r.chunk_id).collect();
            let record = EvaluationRecord {
                query: item.question.clone(),
                response_text: generated.answer.clone(),
                expected_answer: Some(item.expected_answer.clone()),
                gold_chunk_ids: item.gold_chunk_ids.clone(),
                retrieved_chunk_ids: retrieved_chunk_ids.clone(),
                base_retrieved_chunk_ids: base_order(&results),
                cited_chunk_ids: generated.cited_chunk_ids.clone(),
                retrieved_chunks: contexts,
                latency_ms,
            };
            let metrics = evaluate(&record);
            debug!(
                question = %item.question,
                hit = metrics.retrieval_hit_rate,
                latency_ms = metrics.latency_ms,
                "Evaluated item"
            );

            per_item.push(ItemResult {
                question: item.question.clone(),
                answer: generated.answer,
                cited_chunk_ids: generated.cited_chunk_ids,
                metrics,
                retrieved_chunk_ids,
            });
        }

        let item_metrics: Vec<MetricSet> = per_item.iter().map(|r| r.metrics).collect();
        let aggregate = MetricSet::mean(&item_metrics);
        info!(
            items = per_item.len(),
            top_k,
            retrieval_hit_rate = aggregate.retrieval_hit_rate,
            answer_accuracy = aggregate.answer_accuracy,
            "Offline evaluation complete"
        );
        Ok(OfflineReport {
            aggregate,
            per_item,
        })
    }
}

/// Result ids in similarity-only order.
fn base_order(results: &[RankedResult]) -> Vec<i64> {
    let mut rows: Vec<&RankedResult> = results.iter().collect();
    rows.sort_by_key(|r| r.base_rank);
    rows.into_iter().map(|r| r.chunk_id).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn ranked(chunk_id: i64, base_rank: usize, rank: usize) -> RankedResult {
        RankedResult {
            chunk_id,
            content: String::new(),
            base_rank,
            base_score: 0.0,
            lexical_score: 0.0,
            rerank_score: 0.0,
            rank,
            score: 0.0,
        }
    }

    #[test]
    fn test_base_order_sorts_by_base_rank() {
        let results = vec![ranked(30, 3, 1), ranked(10, 1, 2), ranked(20, 2, 3)];
        assert_eq!(base_order(&results), vec![10, 20, 30]);
    }

    #[test]
    fn test_item_defaults_from_json() {
        let item: OfflineEvalItem =
            serde_json::from_str(r#"{"question": "q", "expected_answer": "a"}"#).unwrap();
        assert!(item.gold_chunk_ids.is_empty());
    }
}
