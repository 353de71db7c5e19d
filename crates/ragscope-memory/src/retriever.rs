use ragscope_core::RagResult;
use std::sync::Arc;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::rerank::{candidate_count, clamp_top_k, rerank, RankedResult, RerankOptions};
use crate::store::VectorIndex;

/// Query-side pipeline: embed, over-fetch from the index, rerank, cut.
///
/// Works the same over either backend; only the index behind it changes.
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Retriever over `index`, embedding queries with `embedder`.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// The index this retriever reads from.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// The embedder used for queries.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Retrieve the best `top_k` chunks for `query`.
    ///
    /// `top_k` is clamped to `[1, 20]`; `max(top_k, min(3 * top_k, 50))`
    /// candidates are requested from the index before reranking.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: i64,
        options: RerankOptions,
    ) -> RagResult<Vec<RankedResult>> {
        let top_k = clamp_top_k(top_k);
        let candidates = candidate_count(top_k);

        let query_embedding = self.embedder.embed(query).await?;
        let base_rows = self.index.search(&query_embedding, candidates).await?;
        let fetched = base_rows.len();

        let results = rerank(query, base_rows, top_k, options);
        debug!(
            top_k,
            candidates,
            fetched,
            returned = results.len(),
            rerank = options.enabled,
            method = options.method.as_str(),
            "Retrieved chunks"
        );
        Ok(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedding;
    use crate::rerank::RerankMethod;
    use crate::store::InMemoryVectorIndex;
    use ragscope_core::Chunk;

    async fn make_retriever(contents: &[&str]) -> Retriever {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::default());
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(embedder.clone()));
        let chunks = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Chunk::new(i as i64 + 1, 1, *c))
            .collect();
        index.index(chunks).await.unwrap();
        Retriever::new(index, embedder)
    }

    #[tokio::test]
    async fn test_lexical_ranks_matching_chunk_first() {
        let retriever = make_retriever(&[
            "unrelated content",
            "refund requests are accepted within 14 days",
        ])
        .await;
        let results = retriever
            .retrieve("refund requests", 2, RerankOptions::with_method(RerankMethod::Lexical))
            .await
            .unwrap();
        assert_eq!(results[0].chunk_id, 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].chunk_id, 1);
    }

    #[tokio::test]
    async fn test_top_k_is_clamped() {
        let contents: Vec<String> = (0..30).map(|i| format!("document number {i}")).collect();
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        let retriever = make_retriever(&refs).await;

        let results = retriever
            .retrieve("document", 100, RerankOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 20);

        let results = retriever
            .retrieve("document", 0, RerankOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_overfetch_reaches_past_top_k() {
        // top_k = 1 still pulls 3 candidates, so the only lexical match wins
        // wherever similarity placed it.
        let retriever = make_retriever(&[
            "alpha beta gamma",
            "alpha beta delta",
            "escalation matrix for outages",
        ])
        .await;
        let reranked = retriever
            .retrieve(
                "escalation outages",
                1,
                RerankOptions::with_method(RerankMethod::Lexical),
            )
            .await
            .unwrap();

        assert_eq!(reranked.len(), 1);
        assert_eq!(reranked[0].chunk_id, 3);
        assert_eq!(reranked[0].lexical_score, 1.0);
    }
}
