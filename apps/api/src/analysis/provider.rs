//! Analysis provider: pluggable backend that turns extracted resume text into a
//! `ResumeAnalysis`.
//!
//! Default: `GeminiAnalysisProvider`. Without an API key the service composes
//! `DemoAnalysisProvider`, which serves a canned analysis.
//!
//! `AppState` holds an `Arc<dyn AnalysisProvider>`, chosen once in `main`.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::analysis::models::ResumeAnalysis;
use crate::analysis::prompts::{analysis_prompt, ANALYSIS_SYSTEM};
use crate::analysis::repair::parse_analysis;
use crate::llm_client::{LlmClient, LlmError, ResponseFormat};

const DEMO_ANALYSIS_JSON: &str = include_str!("demo_analysis.json");

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap analysis backends without touching handlers.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, text: &str, file_name: &str) -> Result<ResumeAnalysis, LlmError>;

    /// Short backend tag for logs and health output.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiAnalysisProvider
// ────────────────────────────────────────────────────────────────────────────

pub struct GeminiAnalysisProvider {
    llm: LlmClient,
}

impl GeminiAnalysisProvider {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AnalysisProvider for GeminiAnalysisProvider {
    async fn analyze(&self, text: &str, file_name: &str) -> Result<ResumeAnalysis, LlmError> {
        info!(
            file = %file_name,
            characters = text.chars().count(),
            model = %self.llm.model(),
            "analyzing resume"
        );
        let prompt = analysis_prompt(text, file_name);
        let raw = self
            .llm
            .call_text(&prompt, ANALYSIS_SYSTEM, ResponseFormat::Json)
            .await?;
        let analysis = parse_analysis(&raw)?;
        Ok(finalize(analysis, file_name))
    }

    fn backend(&self) -> &'static str {
        "gemini"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DemoAnalysisProvider
// ────────────────────────────────────────────────────────────────────────────

/// Serves the bundled sample analysis. No network access.
pub struct DemoAnalysisProvider;

#[async_trait]
impl AnalysisProvider for DemoAnalysisProvider {
    async fn analyze(&self, _text: &str, file_name: &str) -> Result<ResumeAnalysis, LlmError> {
        info!(file = %file_name, "serving demo analysis (no API key configured)");
        let mut analysis: ResumeAnalysis = serde_json::from_str(DEMO_ANALYSIS_JSON)?;
        analysis.file_name = file_name.to_string();
        analysis.timestamp = Some(Utc::now());
        Ok(analysis)
    }

    fn backend(&self) -> &'static str {
        "demo"
    }
}

/// Stamps identity fields the model cannot know.
fn finalize(mut analysis: ResumeAnalysis, file_name: &str) -> ResumeAnalysis {
    let now = Utc::now();
    if analysis.analysis_id.trim().is_empty() || analysis.analysis_id == "generated-id" {
        analysis.analysis_id = format!("analysis-{}", now.timestamp_millis());
    }
    analysis.file_name = file_name.to_string();
    analysis.timestamp = Some(now);
    analysis
}
