use thiserror::Error;

/// A convenience `Result` alias using [`RagError`].
pub type RagResult<T> = Result<T, RagError>;

/// Top-level error type for the ragscope engine.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum RagError {
    /// A failure inside a vector index backend.
    #[error("Index error: {0}")]
    Index(String),

    /// A failure talking to the external vector store during a request.
    #[error("Store error: {0}")]
    Store(String),

    /// An embedding could not be produced or has the wrong shape.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// An error raised while evaluating a dataset or record.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the HTTP gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
