use std::sync::Arc;

use crate::analysis::AnalysisProvider;
use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::ExtractionOrchestrator;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured; chat and coaching then degrade.
    pub llm: Option<LlmClient>,
    /// Pluggable analysis backend. Gemini when a key is present, demo data otherwise.
    pub analyzer: Arc<dyn AnalysisProvider>,
    pub extractor: Arc<ExtractionOrchestrator>,
}

impl AppState {
    /// The LLM client, or an error when the service runs without an API key.
    pub fn require_llm(&self) -> Result<&LlmClient, AppError> {
        self.llm
            .as_ref()
            .ok_or_else(|| AppError::ApiKey("GEMINI_API_KEY is not configured".to_string()))
    }
}
