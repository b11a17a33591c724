mod assessment;
mod config;
mod cv_database;
mod errors;
mod llm_client;
mod notifications;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::assessment::analyzer::CandidateAnalyzer;
use crate::assessment::dispatcher::ProgressTracker;
use crate::assessment::llm::LlmAssessor;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::file::FilePersistence;
use crate::store::redis::RedisPersistence;
use crate::store::{AppStore, Persistence};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Assessor API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence: Redis when configured, JSON files otherwise
    let persistence: Arc<dyn Persistence> = match &config.redis_url {
        Some(url) => Arc::new(RedisPersistence::connect(url).await?),
        None => {
            info!("Persisting state under {}", config.state_dir.display());
            Arc::new(FilePersistence::open(&config.state_dir).await?)
        }
    };
    let store = Arc::new(AppStore::load(persistence).await?);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.retry_policy())?;
    info!(
        "LLM client initialized (model: {}, max attempts: {})",
        llm_client::MODEL,
        config.llm_max_attempts
    );

    // One Claude-backed assessor serves every collaborator seam
    let assessor = Arc::new(LlmAssessor(llm));

    let state = AppState {
        store,
        extractor: assessor.clone(),
        analyzer: CandidateAnalyzer::new(assessor.clone(), assessor.clone()),
        summarizer: assessor.clone(),
        chat: assessor,
        progress: Arc::new(ProgressTracker::default()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
