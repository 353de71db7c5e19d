use async_trait::async_trait;
use parking_lot::Mutex;
use ragscope_core::{Chunk, RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::similarity::cosine;

/// Smallest candidate count a search will honor.
pub const MIN_CANDIDATES: usize = 1;
/// Largest candidate count a search will honor.
pub const MAX_CANDIDATES: usize = 50;

/// Clamp a requested candidate count into `[MIN_CANDIDATES, MAX_CANDIDATES]`.
pub fn clamp_candidates(requested: usize) -> usize {
    requested.clamp(MIN_CANDIDATES, MAX_CANDIDATES)
}

/// Which backend is serving the index. Decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Exact cosine scan over an in-process map.
    Memory,
    /// Delegated to a Postgres database with the pgvector extension.
    Pgvector,
}

impl IndexMode {
    /// The name reported by the health check.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMode::Memory => "memory",
            IndexMode::Pgvector => "pgvector",
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One similarity-ordered search hit, before reranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRow {
    /// Stored chunk id.
    pub chunk_id: i64,
    /// Chunk text.
    pub content: String,
    /// Similarity to the query on the cosine scale.
    pub base_score: f64,
    /// 1-based position in the backend's result order.
    pub base_rank: usize,
}

/// Storage-agnostic nearest-neighbor index over embedded chunks.
///
/// Both backends upsert by `chunk_id` and return rows ordered by descending
/// similarity. Ties keep whatever order the backend produced.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upsert chunks, embedding any that arrive without a vector.
    /// Returns the number of chunks written. A batch holding an invalid
    /// embedding is rejected whole and nothing from it is stored.
    async fn index(&self, chunks: Vec<Chunk>) -> RagResult<usize>;

    /// Return up to `candidate_count` (clamped to `[1, 50]`) rows nearest to
    /// `query_embedding`.
    async fn search(
        &self,
        query_embedding: &[f64],
        candidate_count: usize,
    ) -> RagResult<Vec<RetrievalRow>>;

    /// Number of stored chunks.
    async fn count(&self) -> RagResult<usize>;

    /// The backend serving this index.
    fn mode(&self) -> IndexMode;
}

/// Use the chunk's own embedding when present, otherwise embed its content.
///
/// A supplied embedding must have the provider's dimension and finite
/// components.
pub(crate) async fn resolve_embedding(
    chunk: &Chunk,
    embedder: &dyn EmbeddingProvider,
) -> RagResult<Vec<f64>> {
    match &chunk.embedding {
        Some(embedding) if !embedding.is_empty() => {
            check_embedding(embedding, embedder.dimension())?;
            Ok(embedding.clone())
        }
        _ => embedder.embed(&chunk.content).await,
    }
}

/// Reject vectors that would break the fixed-dimension invariant.
pub(crate) fn check_embedding(embedding: &[f64], dimension: usize) -> RagResult<()> {
    if embedding.len() != dimension {
        return Err(RagError::Embedding(format!(
            "expected {dimension} components, got {}",
            embedding.len()
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(RagError::Embedding(
            "embedding contains non-finite components".to_string(),
        ));
    }
    Ok(())
}

/// In-memory index using brute-force cosine similarity.
///
/// Chunks live in a map keyed by `chunk_id` behind a single mutex, always
/// with their embedding filled in; every search scans all of them. Equal
/// scores come back in ascending `chunk_id` order.
pub struct InMemoryVectorIndex {
    entries: Mutex<BTreeMap<i64, Chunk>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl InMemoryVectorIndex {
    /// An empty index using `embedder` for chunks without a vector.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            embedder,
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn index(&self, chunks: Vec<Chunk>) -> RagResult<usize> {
        let mut prepared = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = resolve_embedding(&chunk, self.embedder.as_ref()).await?;
            prepared.push(chunk.with_embedding(embedding));
        }

        let count = prepared.len();
        let mut entries = self.entries.lock();
        for chunk in prepared {
            entries.insert(chunk.chunk_id, chunk);
        }
        debug!(indexed = count, total = entries.len(), "Indexed chunks in memory");
        Ok(count)
    }

    async fn search(
        &self,
        query_embedding: &[f64],
        candidate_count: usize,
    ) -> RagResult<Vec<RetrievalRow>> {
        if query_embedding.is_empty() {
            return Err(RagError::Embedding("Empty query embedding".to_string()));
        }
        check_embedding(query_embedding, self.embedder.dimension())?;
        let limit = clamp_candidates(candidate_count);

        let mut scored: Vec<(i64, f64, String)> = {
            let entries = self.entries.lock();
            entries
                .iter()
                .map(|(chunk_id, chunk)| {
                    let embedding = chunk.embedding.as_deref().unwrap_or_default();
                    (
                        *chunk_id,
                        cosine(query_embedding, embedding),
                        chunk.content.clone(),
                    )
                })
                .collect()
        };

        // Stable sort: equal scores keep map order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(idx, (chunk_id, base_score, content))| RetrievalRow {
                chunk_id,
                content,
                base_score,
                base_rank: idx + 1,
            })
            .collect())
    }

    async fn count(&self) -> RagResult<usize> {
        Ok(self.entries.lock().len())
    }

    fn mode(&self) -> IndexMode {
        IndexMode::Memory
    }
}
