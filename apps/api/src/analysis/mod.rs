// Resume analysis: extracted text in, structured coaching report out.
// All LLM calls go through llm_client; the backend is chosen once at startup.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod provider;
pub mod repair;

pub use models::ResumeAnalysis;
pub use provider::{AnalysisProvider, DemoAnalysisProvider, GeminiAnalysisProvider};
