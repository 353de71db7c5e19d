//! Embedding, vector search and reranking for the ragscope engine.
//!
//! Provides the deterministic hash embedder, cosine and lexical scorers, a
//! storage-agnostic vector index with an in-memory and a pgvector backend,
//! boot-time backend selection, hybrid reranking, and the chunker used to
//! prepare index input.
//!
//! # Main types
//!
//! - [`EmbeddingProvider`]: Trait for text-to-vector functions.
//! - [`HashEmbedding`]: SHA-256 bag-of-tokens embedder.
//! - [`VectorIndex`]: Trait shared by both index backends.
//! - [`InMemoryVectorIndex`]: Exact cosine scan behind a mutex.
//! - [`PgVectorIndex`]: Delegates storage and ANN search to pgvector.
//! - [`Retriever`]: Embed, over-fetch, rerank, truncate.

/// Boot-time backend selection.
pub mod backend;
/// Sentence-aware text chunker.
pub mod chunker;
/// Embedding provider trait and hash implementation.
pub mod embedding;
/// Postgres + pgvector backend.
pub mod pgvector;
/// Hybrid reranking.
pub mod rerank;
/// Query-side retrieval pipeline.
pub mod retriever;
/// Cosine and lexical scorers.
pub mod similarity;
/// Vector index trait and in-memory implementation.
pub mod store;

pub use backend::{bootstrap_index, BackendConfig};
pub use chunker::chunk_text;
pub use embedding::{EmbeddingProvider, HashEmbedding};
pub use pgvector::PgVectorIndex;
pub use rerank::{rerank, RankedResult, RerankMethod, RerankOptions};
pub use retriever::Retriever;
pub use similarity::{cosine, lexical_overlap};
pub use store::{InMemoryVectorIndex, IndexMode, RetrievalRow, VectorIndex};
