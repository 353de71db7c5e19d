//! Route handlers. Each one is a thin adapter from JSON to an engine call.

use axum::{extract::State, Json};
use ragscope_eval::{evaluate, EvaluationRecord, GenerateRequest, GeneratedAnswer, OfflineReport};
use ragscope_memory::{chunk_text, RerankOptions};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::models::{
    ChunkRequest, ChunkResponse, EmbedRequest, EmbedResponse, HealthResponse, IndexRequest,
    IndexResponse, OfflineEvalRequest, OnlineEvalResponse, RetrieveRequest, RetrieveResponse,
};
use crate::server::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `GET /health`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        index_mode: state.index.mode(),
    })
}

/// `POST /embed`.
pub async fn embed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmbedRequest>,
) -> ApiResult<EmbedResponse> {
    let embedding = state.embedder.embed(&req.text).await?;
    Ok(Json(EmbedResponse { embedding }))
}

/// `POST /chunk`.
pub async fn chunk(Json(req): Json<ChunkRequest>) -> Json<ChunkResponse> {
    Json(ChunkResponse {
        chunks: chunk_text(&req.document, req.chunk_size, req.overlap),
    })
}

/// `POST /index`.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IndexRequest>,
) -> ApiResult<IndexResponse> {
    let indexed = state.index.index(req.chunks).await?;
    Ok(Json(IndexResponse {
        indexed,
        mode: state.index.mode(),
    }))
}

/// `POST /retrieve`.
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveRequest>,
) -> ApiResult<RetrieveResponse> {
    let defaults = state.defaults;
    let options = RerankOptions {
        enabled: req.rerank.unwrap_or(defaults.rerank.enabled),
        method: req.rerank_method.unwrap_or(defaults.rerank.method),
    };
    let results = state
        .retriever
        .retrieve(&req.query, req.top_k.unwrap_or(defaults.top_k), options)
        .await?;
    Ok(Json(RetrieveResponse { results }))
}

/// `POST /generate`.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<GeneratedAnswer> {
    Ok(Json(state.generator.generate(&req).await?))
}

/// `POST /eval/online`.
pub async fn eval_online(Json(record): Json<EvaluationRecord>) -> Json<OnlineEvalResponse> {
    Json(OnlineEvalResponse {
        metrics: evaluate(&record),
    })
}

/// `POST /eval/offline`.
pub async fn eval_offline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OfflineEvalRequest>,
) -> ApiResult<OfflineReport> {
    let top_k = req.top_k.unwrap_or(state.defaults.top_k);
    info!(items = req.dataset.len(), top_k, "Offline evaluation requested");
    Ok(Json(state.evaluator.run(&req.dataset, top_k).await?))
}
