use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::models::ResumeAnalysis;
use crate::errors::AppError;
use crate::extraction::{AttemptSummary, ByteReader, ExtractedText, StrategyName, UploadedDocument};
use crate::state::AppState;

/// Multipart field carrying the resume.
const FILE_FIELD: &str = "file";

/// Text a client-side extractor emits when it gave up; analyzing it would be meaningless.
const PLACEHOLDER_MARKERS: [&str; 3] = [
    "Sample Resume Content",
    "This is placeholder text",
    "placeholder text. For full PDF text extraction",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysisRequest {
    pub resume_text: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub strategy: StrategyName,
    pub character_count: usize,
    pub truncated: bool,
    pub attempts: Vec<AttemptSummary>,
}

impl From<&ExtractedText> for ExtractionReport {
    fn from(extracted: &ExtractedText) -> Self {
        Self {
            strategy: extracted.strategy,
            character_count: extracted.text.chars().count(),
            truncated: extracted.truncated,
            attempts: extracted.attempts.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeUploadResponse {
    pub analysis: ResumeAnalysis,
    pub extraction: ExtractionReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub text: String,
    pub strategy: StrategyName,
    pub character_count: usize,
    pub truncated: bool,
}

/// POST /api/analyze-resume
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeUploadResponse>, AppError> {
    let document = read_upload(multipart, state.config.max_upload_bytes).await?;
    let extracted = state.extractor.extract(&document).await?;
    reject_placeholder(&extracted.text)?;

    let analysis = state
        .analyzer
        .analyze(&extracted.text, document.file_name())
        .await?;
    info!(
        file = %document.file_name(),
        strategy = %extracted.strategy,
        score = analysis.overall_score,
        "resume analyzed"
    );

    Ok(Json(AnalyzeUploadResponse {
        extraction: ExtractionReport::from(&extracted),
        analysis,
    }))
}

/// POST /api/analyze-resume/text
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    payload: Result<Json<TextAnalysisRequest>, JsonRejection>,
) -> Result<Json<ResumeAnalysis>, AppError> {
    let Json(req) = payload?;
    let (text, file_name) = match (non_blank(req.resume_text), non_blank(req.file_name)) {
        (Some(text), Some(file_name)) => (text, file_name),
        _ => {
            return Err(AppError::Validation(
                "Resume text and file name are required".to_string(),
            ))
        }
    };
    reject_placeholder(&text)?;

    info!(file = %file_name, characters = text.chars().count(), "analyzing pasted resume text");
    let analysis = state.analyzer.analyze(&text, &file_name).await?;
    Ok(Json(analysis))
}

/// POST /api/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let document = read_upload(multipart, state.config.max_upload_bytes).await?;
    let extracted = state.extractor.extract(&document).await?;
    Ok(Json(ExtractResponse {
        character_count: extracted.text.chars().count(),
        strategy: extracted.strategy,
        truncated: extracted.truncated,
        text: extracted.text,
    }))
}

/// Reads the `file` field, refusing to buffer more than `max_bytes`.
async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<UploadedDocument, AppError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if buffer.len() + chunk.len() > max_bytes {
                return Err(AppError::PayloadTooLarge { limit: max_bytes });
            }
            buffer.extend_from_slice(&chunk);
        }
        if buffer.is_empty() {
            return Err(AppError::Validation("The uploaded file is empty".to_string()));
        }

        return Ok(ByteReader::from_upload(
            file_name.as_deref(),
            content_type.as_deref(),
            buffer.freeze(),
        ));
    }
    Err(AppError::Validation(format!(
        "No file uploaded. Attach your resume in the '{FILE_FIELD}' field."
    )))
}

fn reject_placeholder(text: &str) -> Result<(), AppError> {
    if PLACEHOLDER_MARKERS.iter().any(|marker| text.contains(marker)) {
        return Err(AppError::PlaceholderText);
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
