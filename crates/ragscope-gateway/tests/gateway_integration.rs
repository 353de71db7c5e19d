#![allow(clippy::unwrap_used, clippy::expect_used)]

use ragscope_core::text::round_to;
use ragscope_eval::ExtractiveGenerator;
use ragscope_gateway::{AppState, GatewayServer, RetrievalDefaults};
use ragscope_memory::{EmbeddingProvider, HashEmbedding, InMemoryVectorIndex, VectorIndex};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Helper: build a test server on a random port, returning the base URL.
async fn start_test_server() -> String {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::default());
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(embedder.clone()));
    let state = AppState::new(
        index,
        embedder,
        Arc::new(ExtractiveGenerator::new()),
        RetrievalDefaults::default(),
    );
    let app = GatewayServer::build(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Small yield to let the server task start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{}", addr.port())
}

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn seed(base: &str) {
    let (status, body) = post(
        base,
        "/index",
        json!({
            "chunks": [
                {"chunk_id": 1, "document_id": 1, "content": "The default SSO session timeout is 8 hours."},
                {"chunk_id": 2, "document_id": 1, "content": "Refund requests are accepted within 14 days."}
            ]
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["indexed"], 2);
    assert_eq!(body["mode"], "memory");
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = start_test_server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["index_mode"], "memory");
}

#[tokio::test]
async fn test_embed_returns_unit_vector() {
    let base = start_test_server().await;
    let (status, body) = post(&base, "/embed", json!({"text": "session timeout"})).await;
    assert_eq!(status, 200);
    let embedding: Vec<f64> = serde_json::from_value(body["embedding"].clone()).unwrap();
    assert_eq!(embedding.len(), 16);
    let norm: f64 = embedding.iter().map(|x| x * x).sum::<f64>().sqrt();
    assert!((norm - 1.0).abs() < 1e-6);

    let (_, empty) = post(&base, "/embed", json!({"text": "!!!"})).await;
    assert!(empty["embedding"]
        .as_array()
        .unwrap()
        .iter()
        .all(|v| v.as_f64() == Some(0.0)));
}

#[tokio::test]
async fn test_chunk_endpoint_defaults() {
    let base = start_test_server().await;
    let (status, body) = post(&base, "/chunk", json!({"document": "  Short   document.  "})).await;
    assert_eq!(status, 200);
    assert_eq!(body["chunks"], json!(["Short document."]));

    let (_, body) = post(&base, "/chunk", json!({"document": "   "})).await;
    assert_eq!(body["chunks"], json!([]));
}

#[tokio::test]
async fn test_retrieve_returns_scores_with_rerank_fields() {
    let base = start_test_server().await;
    seed(&base).await;

    let (status, body) = post(
        &base,
        "/retrieve",
        json!({
            "query": "When are refund requests accepted?",
            "top_k": 2,
            "rerank": true,
            "rerank_method": "lexical"
        }),
    )
    .await;
    assert_eq!(status, 200);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["chunk_id"], 2);
    assert_eq!(results[0]["rank"], 1);
    for field in ["base_score", "rerank_score", "base_rank", "lexical_score", "score"] {
        assert!(results[0].get(field).is_some(), "missing {field}");
    }
}

#[tokio::test]
async fn test_retrieve_uses_defaults_and_clamps() {
    let base = start_test_server().await;
    seed(&base).await;

    let (status, body) = post(&base, "/retrieve", json!({"query": "refund", "top_k": 0})).await;
    assert_eq!(status, 200);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    let (_, body) = post(&base, "/retrieve", json!({"query": "refund"})).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_retrieve_without_rerank_keeps_base_order() {
    let base = start_test_server().await;
    seed(&base).await;

    let (_, body) = post(
        &base,
        "/retrieve",
        json!({"query": "refund requests", "rerank": false}),
    )
    .await;
    for r in body["results"].as_array().unwrap() {
        assert_eq!(r["rank"], r["base_rank"]);
        assert_eq!(r["rerank_score"], r["base_score"]);
    }
}

#[tokio::test]
async fn test_reindex_overwrites_chunk() {
    let base = start_test_server().await;
    seed(&base).await;
    let (_, body) = post(
        &base,
        "/index",
        json!({"chunks": [{"chunk_id": 2, "document_id": 1, "content": "Backups run every 6 hours."}]}),
    )
    .await;
    assert_eq!(body["indexed"], 1);

    let (_, body) = post(&base, "/retrieve", json!({"query": "backups", "top_k": 5})).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["content"], "Backups run every 6 hours.");
}

#[tokio::test]
async fn test_index_rejects_wrong_dimension() {
    let base = start_test_server().await;
    let (status, body) = post(
        &base,
        "/index",
        json!({"chunks": [
            {"chunk_id": 8, "document_id": 1, "content": "valid neighbour"},
            {"chunk_id": 9, "document_id": 1, "content": "x", "embedding": [0.5, 0.5]}
        ]}),
    )
    .await;
    assert_eq!(status, 422);
    assert!(body["error"].as_str().unwrap().contains("Embedding"));

    // Nothing from the rejected batch was stored.
    let (_, body) = post(&base, "/retrieve", json!({"query": "valid neighbour"})).await;
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_cites_best_context() {
    let base = start_test_server().await;
    let (status, body) = post(
        &base,
        "/generate",
        json!({
            "query": "How long is the session timeout?",
            "contexts": [
                {"chunk_id": 1, "content": "Refunds are accepted within 14 days."},
                {"chunk_id": 2, "content": "The session timeout is 8 hours. Admins can lower it."}
            ]
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["answer"], "Based on retrieved docs: The session timeout is 8 hours.");
    assert_eq!(body["cited_chunk_ids"], json!([2]));
    assert_eq!(body["model_name"], "stub-rag-1");
    assert_eq!(body["prompt_version"], "v1");
}

#[tokio::test]
async fn test_online_eval_uses_citation_scoped_attribution() {
    let base = start_test_server().await;
    let (status, body) = post(
        &base,
        "/eval/online",
        json!({
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
        }),
    )
    .await;
    assert_eq!(status, 200);
    let m = &body["metrics"];
    assert_eq!(m["retrieval_hit_rate"], 1.0);
    assert_eq!(m["base_retrieval_hit_rate"], 1.0);
    assert_eq!(m["latency_ms"], 123.45);
    let attribution = m["attribution_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&attribution));
    assert!((0.0..=1.0).contains(&m["citation_coverage"].as_f64().unwrap()));
    assert_eq!(
        m["hallucination_rate"].as_f64().unwrap(),
        round_to(1.0 - attribution, 4)
    );
    assert!((0.0..=1.0).contains(&m["answer_accuracy"].as_f64().unwrap()));
}

#[tokio::test]
async fn test_offline_eval_reports_aggregate_and_items() {
    let base = start_test_server().await;
    seed(&base).await;

    let (status, body) = post(
        &base,
        "/eval/offline",
        json!({
            "top_k": 1,
            "dataset": [
                {"question": "When are refund requests accepted?", "expected_answer": "Within 14 days.", "gold_chunk_ids": [1, 2]},
                {"question": "When are refund requests accepted?", "expected_answer": "Within 14 days.", "gold_chunk_ids": [999]}
            ]
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["aggregate"]["retrieval_hit_rate"], 0.5);
    let items = body["per_item"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["retrieved_chunk_ids"].as_array().unwrap().len(), 1);
    assert!(items[0]["metrics"].get("answer_accuracy").is_some());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let base = start_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/retrieve"))
        .json(&json!({"top_k": 3}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}
