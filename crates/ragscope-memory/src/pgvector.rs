//! Delegated ANN backend: a Postgres table with a pgvector column.
//!
//! Vectors travel as `[x1,...,xD]` text literals and are cast on the server
//! with `::text::vector`; similarity is reported as `1 - cosine distance`,
//! which puts it on the same scale as [`crate::similarity::cosine`].

use async_trait::async_trait;
use ragscope_core::{Chunk, RagError, RagResult};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::store::{
    check_embedding, clamp_candidates, resolve_embedding, IndexMode, RetrievalRow, VectorIndex,
};

const UPSERT_SQL: &str = r#"
INSERT INTO rag_vector_index (chunk_id, document_id, content, embedding, updated_at)
VALUES ($1, $2, $3, $4::text::vector, NOW())
ON CONFLICT (chunk_id)
DO UPDATE SET
  document_id = EXCLUDED.document_id,
  content = EXCLUDED.content,
  embedding = EXCLUDED.embedding,
  updated_at = NOW()
"#;

const SEARCH_SQL: &str = r#"
SELECT chunk_id, content, 1 - (embedding <=> $1::text::vector) AS score
FROM rag_vector_index
ORDER BY embedding <=> $1::text::vector
LIMIT $2
"#;

/// Format a vector as a pgvector text literal with 8 decimals per component.
pub fn vector_literal(embedding: &[f64]) -> String {
    let parts: Vec<String> = embedding.iter().map(|x| format!("{x:.8}")).collect();
    format!("[{}]", parts.join(","))
}

fn store_err(context: &str, err: sqlx::Error) -> RagError {
    RagError::Store(format!("{context}: {err}"))
}

/// Vector index backed by Postgres + pgvector.
///
/// A batch is upserted inside one transaction, so it lands whole or not at
/// all; conflicting writes to the same id are serialized by the database.
pub struct PgVectorIndex {
    pool: PgPool,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl PgVectorIndex {
    /// Connect to `database_url` and make sure the extension and table exist.
    ///
    /// `acquire_timeout` bounds every wait for a pooled connection, including
    /// the first one.
    pub async fn connect(
        database_url: &str,
        pool_size: u32,
        acquire_timeout: Duration,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> RagResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size.max(1))
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| store_err("Failed to connect to vector store", e))?;

        let index = Self { pool, embedder };
        index.bootstrap().await?;
        Ok(index)
    }

    async fn bootstrap(&self) -> RagResult<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("Failed to create vector extension", e))?;

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS rag_vector_index (
                chunk_id BIGINT PRIMARY KEY,
                document_id BIGINT NOT NULL,
                content TEXT NOT NULL,
                embedding VECTOR({}) NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            self.embedder.dimension()
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| store_err("Failed to create rag_vector_index", e))?;

        info!(dimension = self.embedder.dimension(), "pgvector schema ready");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn index(&self, chunks: Vec<Chunk>) -> RagResult<usize> {
        // Resolve every vector before touching the table so a bad chunk
        // rejects the whole batch.
        let mut prepared = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let embedding = resolve_embedding(chunk, self.embedder.as_ref()).await?;
            prepared.push((chunk, vector_literal(&embedding)));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_err("Failed to begin transaction", e))?;
        for (chunk, literal) in &prepared {
            sqlx::query(UPSERT_SQL)
                .bind(chunk.chunk_id)
                .bind(chunk.document_id)
                .bind(&chunk.content)
                .bind(literal)
                .execute(&mut *tx)
                .await
                .map_err(|e| store_err("Failed to upsert chunk", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| store_err("Failed to commit chunks", e))?;

        let count = prepared.len();
        debug!(indexed = count, "Indexed chunks in pgvector");
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
        let limit = clamp_candidates(candidate_count) as i64;

        let rows = sqlx::query(SEARCH_SQL)
            .bind(vector_literal(query_embedding))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_err("Vector search failed", e))?;

        rows.iter()
            .enumerate()
            .map(|(idx, row)| -> RagResult<RetrievalRow> {
                Ok(RetrievalRow {
                    chunk_id: row
                        .try_get("chunk_id")
                        .map_err(|e| store_err("Bad chunk_id column", e))?,
                    content: row
                        .try_get("content")
                        .map_err(|e| store_err("Bad content column", e))?,
                    base_score: row
                        .try_get("score")
                        .map_err(|e| store_err("Bad score column", e))?,
                    base_rank: idx + 1,
                })
            })
            .collect()
    }

    async fn count(&self) -> RagResult<usize> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_vector_index")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_err("Failed to count chunks", e))?;
        Ok(usize::try_from(total).unwrap_or_default())
    }

    fn mode(&self) -> IndexMode {
        IndexMode::Pgvector
    }
}
