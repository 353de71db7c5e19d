//! Core types and error definitions for the ragscope engine.
//!
//! This crate provides the foundational pieces shared across all ragscope
//! crates: error handling, the chunk data model and the tokenizer.
//!
//! # Main types
//!
//! - [`RagError`]: Unified error enum for all ragscope subsystems.
//! - [`RagResult`]: Convenience alias for `Result<T, RagError>`.
//! - [`Chunk`]: A unit of indexed text with an optional embedding.
//! - [`ContextChunk`]: A retrieved chunk passed to generation and evaluation.

/// Chunk data model.
pub mod chunk;
/// Error enum and result alias.
pub mod error;
/// Tokenizer, stop words and rounding helpers.
pub mod text;

pub use chunk::{Chunk, ContextChunk};
pub use error::{RagError, RagResult};
