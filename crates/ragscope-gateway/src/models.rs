//! Request and response bodies for the gateway routes.
//!
//! Generation and evaluation reuse the engine's own types
//! ([`GenerateRequest`](ragscope_eval::GenerateRequest),
//! [`EvaluationRecord`](ragscope_eval::EvaluationRecord)) as bodies.

use ragscope_core::Chunk;
use ragscope_eval::{MetricSet, OfflineEvalItem};
use ragscope_memory::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use ragscope_memory::{IndexMode, RankedResult, RerankMethod};
use serde::{Deserialize, Serialize};

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Backend serving the index.
    pub index_mode: IndexMode,
}

/// `POST /embed` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Text to embed.
    pub text: String,
}

/// `POST /embed` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// The embedding vector.
    pub embedding: Vec<f64>,
}

fn default_chunk_size() -> i64 {
    DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> i64 {
    DEFAULT_OVERLAP
}

/// `POST /chunk` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    /// Text to split.
    pub document: String,
    /// Window size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
    /// Characters shared by adjacent windows.
    #[serde(default = "default_overlap")]
    pub overlap: i64,
}

/// `POST /chunk` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResponse {
    /// Chunk texts in document order.
    pub chunks: Vec<String>,
}

/// `POST /index` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRequest {
    /// Chunks to upsert.
    pub chunks: Vec<Chunk>,
}

/// `POST /index` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Number of chunks written.
    pub indexed: usize,
    /// Backend that stored them.
    pub mode: IndexMode,
}

/// Omitted fields fall back to the server's retrieval defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    /// Query text.
    pub query: String,
    /// Number of results.
    #[serde(default)]
    pub top_k: Option<i64>,
    /// Whether to rerank.
    #[serde(default)]
    pub rerank: Option<bool>,
    /// Reranking method.
    #[serde(default)]
    pub rerank_method: Option<RerankMethod>,
}

/// `POST /retrieve` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// Ranked results, best first.
    pub results: Vec<RankedResult>,
}

/// `POST /eval/online` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineEvalResponse {
    /// Metrics for the record.
    pub metrics: MetricSet,
}

/// `POST /eval/offline` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineEvalRequest {
    /// Labeled questions.
    pub dataset: Vec<OfflineEvalItem>,
    /// Results per question.
    #[serde(default)]
    pub top_k: Option<i64>,
}
