//! `ragscope.toml` loading and environment overrides.
//!
//! Every section is defaulted, so a missing file or an empty one yields a
//! working in-memory setup.

use ragscope_core::{RagError, RagResult};
use ragscope_gateway::RetrievalDefaults;
use ragscope_memory::backend::DEFAULT_CONNECT_TIMEOUT;
use ragscope_memory::embedding::DEFAULT_DIMENSION;
use ragscope_memory::{BackendConfig, RerankMethod, RerankOptions};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Top-level contents of `ragscope.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RagscopeConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding and vector store settings.
    #[serde(default)]
    pub index: IndexConfig,
    /// Defaults for retrieval requests.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[index]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexConfig {
    /// Embedding dimension, clamped to `1..=32` by the embedder.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// Unset or blank selects the in-memory backend.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Upper bound on the initial store connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum pooled store connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            database_url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            pool_size: default_pool_size(),
        }
    }
}

/// `[retrieval]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievalConfig {
    /// Results per query.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    /// Whether reranking is on.
    #[serde(default = "default_rerank")]
    pub rerank: bool,
    /// Reranking method.
    #[serde(default)]
    pub rerank_method: RerankMethod,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            rerank: default_rerank(),
            rerank_method: RerankMethod::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_embedding_dim() -> usize {
    DEFAULT_DIMENSION
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}
fn default_pool_size() -> u32 {
    4
}
fn default_top_k() -> i64 {
    5
}
fn default_rerank() -> bool {
    true
}

impl RagscopeConfig {
    /// Parse `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: &Path) -> RagResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
            .map_err(|e| RagError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a TOML document.
    pub fn from_toml(raw: &str) -> RagResult<Self> {
        toml::from_str(raw).map_err(|e| RagError::Config(e.to_string()))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> RagResult<()> {
        if let Some(v) = lookup("EMBEDDING_DIM") {
            self.index.embedding_dim = parse_var("EMBEDDING_DIM", &v)?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.index.database_url = Some(v);
        }
        if let Some(v) = lookup("RERANK_ENABLED") {
            self.retrieval.rerank = parse_flag("RERANK_ENABLED", &v)?;
        }
        if let Some(v) = lookup("RERANK_METHOD") {
            self.retrieval.rerank_method = RerankMethod::parse_method(&v);
        }
        if let Some(v) = lookup("RAGSCOPE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("RAGSCOPE_PORT") {
            self.server.port = parse_var("RAGSCOPE_PORT", &v)?;
        }
        Ok(())
    }

    /// Load `path` and apply the process environment on top.
    pub fn resolve(path: &Path) -> RagResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Backend selection settings for [`ragscope_memory::bootstrap_index`].
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            database_url: self.index.database_url.clone(),
            connect_timeout: Duration::from_millis(self.index.connect_timeout_ms),
            pool_size: self.index.pool_size,
        }
    }

    /// Defaults the gateway applies to requests that omit retrieval fields.
    pub fn retrieval_defaults(&self) -> RetrievalDefaults {
        RetrievalDefaults {
            top_k: self.retrieval.top_k,
            rerank: RerankOptions {
                enabled: self.retrieval.rerank,
                method: self.retrieval.rerank_method,
            },
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> RagResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RagError::Config(format!("invalid {name}: {value:?}")))
}

fn parse_flag(name: &str, value: &str) -> RagResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RagError::Config(format!("invalid {name}: {value:?}"))),
    }
}
