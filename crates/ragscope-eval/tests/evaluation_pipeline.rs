#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Metric invariants and end-to-end offline evaluation over the in-memory
//! index.

use proptest::prelude::*;
use ragscope_core::text::round_to;
use ragscope_core::{Chunk, ContextChunk};
use ragscope_eval::metrics::hit_rate;
use ragscope_eval::{
    evaluate, EvaluationRecord, ExtractiveGenerator, OfflineEvalItem, OfflineEvaluator,
};
use ragscope_memory::{
    EmbeddingProvider, HashEmbedding, InMemoryVectorIndex, Retriever, VectorIndex,
};
use std::sync::Arc;

const VOCAB: &[&str] = &[
    "the", "timeout", "is", "8", "hours", "refund", "requests", "accepted", "within", "14",
    "days", "sso", "session", "of", "backup", "audit", "logs",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 0..12).prop_map(|w| w.join(" "))
}

fn ids() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..8, 0..5)
}

fn record() -> impl Strategy<Value = EvaluationRecord> {
    (
        sentence(),
        prop::option::of(sentence()),
        ids(),
        ids(),
        ids(),
        ids(),
        prop::collection::vec((1i64..8, sentence()), 0..5),
        0.0f64..10_000.0,
    )
        .prop_map(
            |(response, expected, gold, retrieved, base, cited, chunks, latency)| {
                EvaluationRecord {
                    query: "query".into(),
                    response_text: response,
                    expected_answer: expected,
                    gold_chunk_ids: gold,
                    retrieved_chunk_ids: retrieved,
                    base_retrieved_chunk_ids: base,
                    cited_chunk_ids: cited,
                    retrieved_chunks: chunks
                        .into_iter()
                        .map(|(id, text)| ContextChunk::new(id, text))
                        .collect(),
                    latency_ms: latency,
                }
            },
        )
}

proptest! {
    #[test]
    fn hallucination_complements_attribution(r in record()) {
        let m = evaluate(&r);
        let expected = round_to(1.0 - m.attribution_score, 4);
        prop_assert_eq!(m.hallucination_rate, expected);
    }

    #[test]
    fn ratio_metrics_stay_in_unit_interval(r in record()) {
        let m = evaluate(&r);
        for v in [
            m.retrieval_hit_rate,
            m.base_retrieval_hit_rate,
            m.faithfulness,
            m.citation_coverage,
            m.attribution_score,
            m.hallucination_rate,
            m.answer_accuracy,
        ] {
            prop_assert!((0.0..=1.0).contains(&v), "{v} out of range");
        }
        prop_assert_eq!(m.citation_coverage, m.attribution_score);
    }

    #[test]
    fn evaluation_is_deterministic(r in record()) {
        prop_assert_eq!(evaluate(&r), evaluate(&r.clone()));
    }

    #[test]
    fn ranking_shift_is_bounded_by_list_lengths(r in record()) {
        let m = evaluate(&r);
        let bound = r.retrieved_chunk_ids.len().max(r.base_retrieved_chunk_ids.len()) as f64;
        prop_assert!(m.ranking_shift.abs() <= bound);
    }
}

#[test]
fn test_hit_rate_gold_membership() {
    assert_eq!(hit_rate(&[10, 11], &[10]), 1.0);
    assert_eq!(hit_rate(&[11], &[10]), 0.0);
}

#[test]
fn test_citation_scoped_attribution() {
    let record: EvaluationRecord = serde_json::from_value(serde_json::json!({
        "query": "What is the timeout?",
        "response_text": "Based on retrieved docs: The timeout is 8 hours.",
        "expected_answer": "The timeout is 8 hours.",
        "gold_chunk_ids": [10],
        "retrieved_chunk_ids": [10, 11],
        "base_retrieved_chunk_ids": [10, 11],
        "cited_chunk_ids": [10],
        "retrieved_chunks": [
            {"chunk_id": 10, "content": "The timeout is 8 hours for SSO sessions."},
            {"chunk_id": 11, "content": "Refunds are accepted within 14 days."}
        ],
        "latency_ms": 123.45
    }))
    .unwrap();

    let m = evaluate(&record);
    assert_eq!(m.retrieval_hit_rate, 1.0);
    assert_eq!(m.base_retrieval_hit_rate, 1.0);
    assert_eq!(m.latency_ms, 123.45);
    assert!((0.0..=1.0).contains(&m.attribution_score));
    assert_eq!(
        m.hallucination_rate,
        round_to(1.0 - m.attribution_score, 4)
    );
    assert!((0.0..=1.0).contains(&m.answer_accuracy));
}

async fn evaluator(chunks: Vec<Chunk>) -> OfflineEvaluator {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::default());
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(embedder.clone()));
    index.index(chunks).await.unwrap();
    OfflineEvaluator::new(
        Arc::new(Retriever::new(index, embedder)),
        Arc::new(ExtractiveGenerator::new()),
    )
}

fn seeded_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(101, 1, "Single sign-on (SSO) is available on Pro and Enterprise plans. Customers can connect Okta or Azure AD using SAML 2.0."),
        Chunk::new(102, 1, "The default SSO session timeout is 8 hours. Admins can lower the timeout to 1 hour for high-security environments."),
        Chunk::new(103, 1, "Multi-factor authentication is required for workspace owners and billing admins. Standard members can enable MFA optionally."),
        Chunk::new(110, 2, "Refund requests are accepted within 14 days of the initial purchase for new annual subscriptions."),
        Chunk::new(114, 3, "Database backups run every 6 hours with point-in-time recovery enabled. Backup retention is 30 days."),
    ]
}

#[tokio::test]
async fn test_offline_aggregate_is_mean_of_items() {
    let eval = evaluator(vec![
        Chunk::new(1, 1, "Refund requests are accepted within 14 days."),
        Chunk::new(2, 1, "The default SSO session timeout is 8 hours."),
    ])
    .await;
    let dataset = vec![
        OfflineEvalItem {
            question: "When are refund requests accepted?".into(),
            expected_answer: "Within 14 days.".into(),
            gold_chunk_ids: vec![1, 2],
        },
        OfflineEvalItem {
            question: "When are refund requests accepted?".into(),
            expected_answer: "Within 14 days.".into(),
            gold_chunk_ids: vec![999],
        },
    ];

    let report = eval.run(&dataset, 1).await.unwrap();
    assert_eq!(report.per_item.len(), 2);
    assert_eq!(report.per_item[0].metrics.retrieval_hit_rate, 1.0);
    assert_eq!(report.per_item[1].metrics.retrieval_hit_rate, 0.0);
    assert_eq!(report.aggregate.retrieval_hit_rate, 0.5);
}

#[tokio::test]
async fn test_offline_items_cite_retrieved_chunks() {
    let eval = evaluator(seeded_chunks()).await;
    let dataset = vec![
        OfflineEvalItem {
            question: "What is the default SSO session timeout?".into(),
            expected_answer: "The default SSO session timeout is 8 hours.".into(),
            gold_chunk_ids: vec![102],
        },
        OfflineEvalItem {
            question: "When are refund requests accepted?".into(),
            expected_answer: "Refund requests are accepted within 14 days.".into(),
            gold_chunk_ids: vec![110],
        },
    ];

    let report = eval.run(&dataset, 3).await.unwrap();
    for item in &report.per_item {
        assert!(item.retrieved_chunk_ids.len() <= 3);
        assert_eq!(item.cited_chunk_ids.len(), 1);
        assert!(item.retrieved_chunk_ids.contains(&item.cited_chunk_ids[0]));
        assert!(item.answer.starts_with("Based on retrieved docs: "));
        assert!(item.metrics.latency_ms >= 0.0);
        assert!((0.0..=1.0).contains(&item.metrics.answer_accuracy));
    }
    assert!((0.0..=1.0).contains(&report.aggregate.retrieval_hit_rate));
}

#[tokio::test]
async fn test_offline_empty_dataset() {
    let eval = evaluator(seeded_chunks()).await;
    let report = eval.run(&[], 5).await.unwrap();
    assert!(report.per_item.is_empty());
    assert_eq!(report.aggregate.retrieval_hit_rate, 0.0);
    assert_eq!(report.aggregate.latency_ms, 0.0);
}

#[tokio::test]
async fn test_offline_on_empty_index_answers_without_context() {
    let eval = evaluator(Vec::new()).await;
    let dataset = vec![OfflineEvalItem {
        question: "What is the timeout?".into(),
        expected_answer: "8 hours".into(),
        gold_chunk_ids: vec![],
    }];
    let report = eval.run(&dataset, 5).await.unwrap();
    let item = &report.per_item[0];
    assert!(item.retrieved_chunk_ids.is_empty());
    assert!(item.cited_chunk_ids.is_empty());
    assert_eq!(item.metrics.retrieval_hit_rate, 0.0);
    assert_eq!(item.metrics.hallucination_rate, 1.0);
}
