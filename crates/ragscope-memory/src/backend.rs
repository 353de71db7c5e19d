//! Boot-time backend selection.
//!
//! [`bootstrap_index`] runs once at startup. It returns the pgvector backend
//! when a database is configured and reachable within the connect timeout,
//! and the in-memory backend otherwise. The choice is carried by the returned
//! index ([`VectorIndex::mode`]) and never revisited for the life of the
//! process.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::embedding::EmbeddingProvider;
use crate::pgvector::PgVectorIndex;
use crate::store::{InMemoryVectorIndex, VectorIndex};

/// Default bound on the initial connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Settings for choosing and opening the vector index backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Postgres URL of the pgvector store. `None` or blank selects memory mode.
    pub database_url: Option<String>,
    /// Upper bound on the initial connection and schema setup.
    pub connect_timeout: Duration,
    /// Maximum pooled connections to the store.
    pub pool_size: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool_size: 4,
        }
    }
}

impl BackendConfig {
    /// A config that always selects the in-memory backend.
    pub fn memory() -> Self {
        Self::default()
    }

    /// A config pointing at a pgvector database.
    pub fn pgvector(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            ..Self::default()
        }
    }

    /// Override the connect timeout. Chainable builder method.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Open the vector index for this process.
///
/// Never fails: an unreachable or misconfigured store is logged and the
/// in-memory backend is used instead.
pub async fn bootstrap_index(
    config: &BackendConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Arc<dyn VectorIndex> {
    let Some(url) = config
        .database_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    else {
        info!(mode = "memory", "No vector store configured, using in-memory index");
        return Arc::new(InMemoryVectorIndex::new(embedder));
    };

    let attempt = PgVectorIndex::connect(
        url,
        config.pool_size,
        config.connect_timeout,
        embedder.clone(),
    );

    match tokio::time::timeout(config.connect_timeout, attempt).await {
        Ok(Ok(index)) => {
            info!(mode = "pgvector", pool_size = config.pool_size, "Vector store connected");
            Arc::new(index)
        }
        Ok(Err(e)) => {
            warn!(
                mode = "memory",
                error = %e,
                "Vector store unavailable, falling back to in-memory index"
            );
            Arc::new(InMemoryVectorIndex::new(embedder))
        }
        Err(_) => {
            warn!(
                mode = "memory",
                timeout_ms = config.connect_timeout.as_millis() as u64,
                "Vector store connection timed out, falling back to in-memory index"
            );
            Arc::new(InMemoryVectorIndex::new(embedder))
        }
    }
}
