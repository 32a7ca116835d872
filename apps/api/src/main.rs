mod analysis;
mod chat;
mod coaching;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::{AnalysisProvider, DemoAnalysisProvider, GeminiAnalysisProvider};
use crate::config::Config;
use crate::extraction::ExtractionOrchestrator;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerBoost API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and analysis backend
    let llm = config
        .gemini_api_key
        .clone()
        .map(|key| LlmClient::new(key, config.gemini_model.clone()));

    let analyzer: Arc<dyn AnalysisProvider> = match &llm {
        Some(client) => {
            info!("LLM client initialized (model: {})", client.model());
            Arc::new(GeminiAnalysisProvider::new(client.clone()))
        }
        None => {
            warn!("GEMINI_API_KEY is not set; serving demo analysis data");
            Arc::new(DemoAnalysisProvider)
        }
    };

    // Initialize the extraction pipeline
    let limits = config.extraction_limits();
    let extractor = Arc::new(ExtractionOrchestrator::new(limits));
    info!(
        "Extraction limits: {} pages, {}s structured timeout, {} byte uploads",
        limits.max_pages,
        limits.structured_timeout.as_secs(),
        config.max_upload_bytes
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        llm,
        analyzer,
        extractor,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
