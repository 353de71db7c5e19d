use crate::middleware::request_log_middleware;
use crate::routes;
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use ragscope_eval::{AnswerGenerator, OfflineEvaluator};
use ragscope_memory::{EmbeddingProvider, RerankOptions, Retriever, VectorIndex};
use std::sync::Arc;
use tracing::info;

/// Values used when a request omits its retrieval settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalDefaults {
    /// Results per query.
    pub top_k: i64,
    /// Reranking switches.
    pub rerank: RerankOptions,
}

impl Default for RetrievalDefaults {
    fn default() -> Self {
        Self {
            top_k: 5,
            rerank: RerankOptions::default(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Vector index chosen at startup.
    pub index: Arc<dyn VectorIndex>,
    /// Embedder for `/embed` and queries.
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Query pipeline over `index`.
    pub retriever: Arc<Retriever>,
    /// Answer generator.
    pub generator: Arc<dyn AnswerGenerator>,
    /// Batch evaluator over `retriever` and `generator`.
    pub evaluator: OfflineEvaluator,
    /// Retrieval defaults.
    pub defaults: RetrievalDefaults,
}

impl AppState {
    /// Wire the retriever and offline evaluator over `index`.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn AnswerGenerator>,
        defaults: RetrievalDefaults,
    ) -> Self {
        let retriever = Arc::new(Retriever::new(index.clone(), embedder.clone()));
        let evaluator = OfflineEvaluator::new(retriever.clone(), generator.clone());
        Self {
            index,
            embedder,
            retriever,
            generator,
            evaluator,
            defaults,
        }
    }
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router with request logging on every route.
    pub fn build(state: AppState) -> Router {
        info!(
            index_mode = %state.index.mode(),
            top_k = state.defaults.top_k,
            rerank = state.defaults.rerank.enabled,
            rerank_method = state.defaults.rerank.method.as_str(),
            "Building gateway"
        );

        Router::new()
            .route("/health", get(routes::health))
            .route("/embed", post(routes::embed))
            .route("/chunk", post(routes::chunk))
            .route("/index", post(routes::index))
            .route("/retrieve", post(routes::retrieve))
            .route("/generate", post(routes::generate))
            .route("/eval/online", post(routes::eval_online))
            .route("/eval/offline", post(routes::eval_offline))
            .with_state(Arc::new(state))
            .layer(axum_mw::from_fn(request_log_middleware))
    }
}
