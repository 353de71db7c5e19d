use async_trait::async_trait;
use ragscope_core::text::{normalize_tokens, round_to};
use ragscope_core::RagResult;
use sha2::{Digest, Sha256};

/// Embedding dimension used when none is configured.
pub const DEFAULT_DIMENSION: usize = 16;

/// Largest supported dimension: one component per SHA-256 digest byte.
pub const MAX_DIMENSION: usize = 32;

/// Decimal digits kept in every embedding component.
const COMPONENT_DIGITS: i32 = 8;

/// Trait for computing text embeddings (vector representations).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute embedding vector for a single text.
    async fn embed(&self, text: &str) -> RagResult<Vec<f64>>;

    /// Compute embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[&str]) -> RagResult<Vec<Vec<f64>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the embedding vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Deterministic SHA-256 bag-of-tokens embedding.
///
/// Every token contributes the first `dimension` bytes of its SHA-256 digest
/// to an accumulator; the sum is L2-normalized and rounded to 8 decimals.
/// Text without tokens maps to the zero vector. The result depends only on
/// the token multiset, so it is stable across processes and word orders.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    /// Creates an embedder; `dimension` is clamped to `1..=32`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.clamp(1, MAX_DIMENSION),
        }
    }

    /// Synchronous form of [`EmbeddingProvider::embed`]; never fails.
    pub fn embed_text(&self, text: &str) -> Vec<f64> {
        let tokens = normalize_tokens(text);
        let mut vector = vec![0.0f64; self.dimension];
        if tokens.is_empty() {
            return vector;
        }

        for token in &tokens {
            let digest = Sha256::digest(token.as_bytes());
            for (slot, byte) in vector.iter_mut().zip(digest.iter()) {
                *slot += f64::from(*byte);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
            .into_iter()
            .map(|v| round_to(v, COMPONENT_DIGITS))
            .collect()
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> RagResult<Vec<f64>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
