mod analysis;
mod candidates;
mod config;
mod db;
mod embedding;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod reports;
mod routes;
mod similarity;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::{GitHubLinkExtractor, LlmAnalysisOrchestrator};
use crate::config::Config;
use crate::db::{create_pool, migrate};
use crate::embedding::{DisabledEmbedder, Embedder, HttpEmbedder};
use crate::reports::ReportArchive;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentBackend, DocumentStore, InMemoryBackend, PgBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Aider API v{}", env!("CARGO_PKG_VERSION"));

    // Document store: PostgreSQL when configured, otherwise process memory
    let backend: Arc<dyn DocumentBackend> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await.context("connecting to PostgreSQL")?;
            migrate(&pool).await.context("creating schema")?;
            Arc::new(PgBackend::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            Arc::new(InMemoryBackend::new())
        }
    };
    let store = DocumentStore::new(backend, config.store_config());
    info!(
        "Document store ready (similarity threshold {}, timeout {}ms)",
        config.similarity_threshold,
        config.storage_timeout.as_millis()
    );

    // Embeddings degrade to empty vectors when no endpoint is configured
    let embedder: Arc<dyn Embedder> = match &config.embedding {
        Some(e) => {
            info!("Embedder initialized (model: {}, url: {})", e.model, e.url);
            Arc::new(HttpEmbedder::new(e.url.clone(), e.model.clone(), e.api_key.clone()))
        }
        None => {
            warn!("EMBEDDING_URL not set; descriptions will not be deduplicated by similarity");
            Arc::new(DisabledEmbedder)
        }
    };

    // Initialize LLM-backed analysis
    let analyzer = Arc::new(LlmAnalysisOrchestrator::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize S3 / MinIO report archive
    let reports = match &config.s3 {
        Some(s3) => {
            let archive = ReportArchive::connect(s3).await;
            info!("Report archive initialized (bucket: {})", s3.bucket);
            Some(archive)
        }
        None => None,
    };

    let state = AppState {
        store,
        embedder,
        analyzer,
        links: GitHubLinkExtractor::new(),
        reports,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
