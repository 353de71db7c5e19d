use serde::{Deserialize, Serialize};

/// A unit of indexed text.
///
/// `embedding` is optional on the way in; the index computes one from
/// `content` when it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier; re-indexing the same id replaces the stored chunk.
    pub chunk_id: i64,
    /// Identifier of the document this chunk was cut from.
    pub document_id: i64,
    /// The chunk text.
    pub content: String,
    /// Pre-computed embedding, if the caller has one.
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
}

impl Chunk {
    /// Creates a chunk without an embedding.
    pub fn new(chunk_id: i64, document_id: i64, content: impl Into<String>) -> Self {
        Self {
            chunk_id,
            document_id,
            content: content.into(),
            embedding: None,
        }
    }

    /// Attaches a pre-computed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A retrieved chunk as handed to the generator and the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextChunk {
    /// Identifier of the chunk.
    pub chunk_id: i64,
    /// The chunk text.
    pub content: String,
}

impl ContextChunk {
    /// Creates a context chunk.
    pub fn new(chunk_id: i64, content: impl Into<String>) -> Self {
        Self {
            chunk_id,
            content: content.into(),
        }
    }
}
