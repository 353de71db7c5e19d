//! `ragscope` command line: serve the gateway, index a corpus, or run an
//! offline evaluation from the shell.

mod config;

use clap::{Parser, Subcommand};
use config::RagscopeConfig;
use ragscope_core::Chunk;
use ragscope_eval::{ExtractiveGenerator, OfflineEvalItem, OfflineEvaluator};
use ragscope_gateway::{AppState, GatewayServer};
use ragscope_memory::chunker::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use ragscope_memory::{
    bootstrap_index, chunk_text, EmbeddingProvider, HashEmbedding, InMemoryVectorIndex,
    Retriever, VectorIndex,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragscope", about = "ragscope: RAG retrieval and evaluation engine")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "ragscope.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the embedding of a text
    Embed { text: String },
    /// Split a text file into overlapping chunks
    Chunk {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: i64,
        #[arg(long, default_value_t = DEFAULT_OVERLAP)]
        overlap: i64,
    },
    /// Run an offline evaluation against an in-memory index
    Eval {
        /// JSON array of {question, expected_answer, gold_chunk_ids}
        dataset: PathBuf,
        /// JSON array of {chunk_id, document_id, content}
        #[arg(long)]
        corpus: PathBuf,
        /// Results per question (overrides config)
        #[arg(long)]
        top_k: Option<i64>,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = RagscopeConfig::resolve(&cli.config)?;

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(HashEmbedding::new(config.index.embedding_dim));

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let index = bootstrap_index(&config.backend_config(), embedder.clone()).await;
            info!(
                index_mode = %index.mode(),
                embedding_dim = embedder.dimension(),
                "Index ready"
            );

            let state = AppState::new(
                index,
                embedder,
                Arc::new(ExtractiveGenerator::new()),
                config.retrieval_defaults(),
            );
            let app = GatewayServer::build(state);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("ragscope gateway listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Embed { text } => {
            let embedding = embedder.embed(&text).await?;
            println!("{}", serde_json::json!({ "embedding": embedding }));
        }
        Commands::Chunk {
            file,
            chunk_size,
            overlap,
        } => {
            let document = std::fs::read_to_string(&file)
                .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", file.display(), e))?;
            let chunks = chunk_text(&document, chunk_size, overlap);
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "chunks": chunks }))?);
        }
        Commands::Eval {
            dataset,
            corpus,
            top_k,
        } => {
            let chunks: Vec<Chunk> = read_json(&corpus)?;
            let items: Vec<OfflineEvalItem> = read_json(&dataset)?;

            let index: Arc<dyn VectorIndex> =
                Arc::new(InMemoryVectorIndex::new(embedder.clone()));
            let indexed = index.index(chunks).await?;
            info!(indexed, items = items.len(), "Corpus loaded");

            let evaluator = OfflineEvaluator::new(
                Arc::new(Retriever::new(index, embedder)),
                Arc::new(ExtractiveGenerator::new()),
            );
            let report = evaluator
                .run(&items, top_k.unwrap_or(config.retrieval.top_k))
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
