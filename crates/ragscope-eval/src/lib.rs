//! Evaluation for the ragscope engine.
//!
//! - [`evaluate`] turns one interaction into a [`MetricSet`].
//! - [`ExtractiveGenerator`] is the deterministic answer stub behind the
//!   [`AnswerGenerator`] trait.
//! - [`OfflineEvaluator`] runs retrieve, generate and evaluate over a labeled
//!   dataset and averages the results.

/// Answer generator trait and extractive stub.
pub mod generator;
/// Per-interaction metrics.
pub mod metrics;
/// Labeled-dataset batch evaluation.
pub mod offline;

pub use generator::{
    select_context, AnswerGenerator, ExtractiveGenerator, GenerateRequest, GeneratedAnswer,
};
pub use metrics::{evaluate, EvaluationRecord, MetricSet};
pub use offline::{ItemResult, OfflineEvalItem, OfflineEvaluator, OfflineReport};
