//! Answer generation.
//!
//! [`ExtractiveGenerator`] is a deterministic stand-in for a language model:
//! it quotes the first sentence of the context that best matches the query
//! and cites it. Real model backends plug in through [`AnswerGenerator`].

use async_trait::async_trait;
use ragscope_core::text::content_token_set;
use ragscope_core::{ContextChunk, RagResult};
use serde::{Deserialize, Serialize};

/// Model name reported when the caller does not pick one.
pub const DEFAULT_MODEL_NAME: &str = "stub-rag-1";
/// Prompt version reported when the caller does not pick one.
pub const DEFAULT_PROMPT_VERSION: &str = "v1";
/// Answer returned when there is nothing to ground on.
pub const NO_CONTEXT_ANSWER: &str = "I could not find relevant context to answer this query.";

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_prompt_version() -> String {
    DEFAULT_PROMPT_VERSION.to_string()
}

/// Input to a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The user question.
    pub query: String,
    /// Retrieved chunks to ground the answer on.
    #[serde(default)]
    pub contexts: Vec<ContextChunk>,
    /// Model name echoed in the answer.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Prompt version echoed in the answer.
    #[serde(default = "default_prompt_version")]
    pub prompt_version: String,
    /// Accepted for model backends; the extractive generator ignores it.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl GenerateRequest {
    /// A request with the default model name and prompt version.
    pub fn new(query: impl Into<String>, contexts: Vec<ContextChunk>) -> Self {
        Self {
            query: query.into(),
            contexts,
            model_name: default_model_name(),
            prompt_version: default_prompt_version(),
            prompt_template: None,
        }
    }
}

/// A generated answer and the chunks it relied on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    /// Answer text.
    pub answer: String,
    /// Model that produced the answer.
    pub model_name: String,
    /// Prompt version used.
    pub prompt_version: String,
    /// Chunks the answer relies on.
    pub cited_chunk_ids: Vec<i64>,
}

/// Produces an answer for a query from retrieved contexts.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer. Implementations should echo the request's model
    /// name and prompt version.
    async fn generate(&self, request: &GenerateRequest) -> RagResult<GeneratedAnswer>;
}

/// Pick the context sharing the most distinct content tokens with `query`.
///
/// Ties keep the earlier context; with no overlap anywhere the first context
/// wins. `None` only for an empty slice.
pub fn select_context<'a>(query: &str, contexts: &'a [ContextChunk]) -> Option<&'a ContextChunk> {
    let query_tokens = content_token_set(query);
    let mut best: Option<(&ContextChunk, usize)> = None;
    for ctx in contexts {
        let score = content_token_set(&ctx.content)
            .intersection(&query_tokens)
            .count();
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((ctx, score)),
        }
    }
    best.map(|(ctx, _)| ctx)
}

/// Text up to the first `". "`, trimmed.
fn first_sentence(content: &str) -> &str {
    content.split(". ").next().unwrap_or_default().trim()
}

/// Deterministic extractive generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    /// Create the generator.
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`AnswerGenerator::generate`].
    pub fn answer(&self, request: &GenerateRequest) -> GeneratedAnswer {
        let (answer, cited_chunk_ids) = match select_context(&request.query, &request.contexts) {
            Some(ctx) => (
                format!("Based on retrieved docs: {}.", first_sentence(&ctx.content)),
                vec![ctx.chunk_id],
            ),
            None => (NO_CONTEXT_ANSWER.to_string(), Vec::new()),
        };
        GeneratedAnswer {
            answer,
            model_name: request.model_name.clone(),
            prompt_version: request.prompt_version.clone(),
            cited_chunk_ids,
        }
    }
}

#[async_trait]
impl AnswerGenerator for ExtractiveGenerator {
    async fn generate(&self, request: &GenerateRequest) -> RagResult<GeneratedAnswer> {
        Ok(self.answer(request))
    }
}
