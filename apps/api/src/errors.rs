use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::extraction::{ExtractionFailure, FailureReason};
use crate::llm_client::LlmError;

/// Seconds a client should wait after the LLM quota is exhausted.
pub const RATE_LIMIT_RETRY_AFTER_SECS: u64 = 300;

const PLACEHOLDER_MESSAGE: &str = "Failed to extract text from your PDF. This could be because:\n\
    • The PDF contains only images (scanned document)\n\
    • The PDF is password protected\n\
    • The file is corrupted\n\n\
    Please try:\n\
    • Converting your PDF to a Word document (.docx)\n\
    • Using a text-based PDF (not a scanned image)\n\
    • Uploading a plain text file (.txt)";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionFailure),

    #[error("Upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resume text is placeholder content, not a real resume")]
    PlaceholderText,

    #[error("LLM rate limit exceeded")]
    RateLimited,

    #[error("LLM API key rejected: {0}")]
    ApiKey(String),

    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        if err.is_rate_limited() {
            AppError::RateLimited
        } else if err.is_api_key_problem() {
            AppError::ApiKey(err.to_string())
        } else if let LlmError::Blocked { reason } = err {
            AppError::ContentBlocked(reason)
        } else {
            AppError::Analysis(err.to_string())
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge { limit: 0 }
        } else {
            AppError::Validation(err.body_text())
        }
    }
}

/// Malformed or mistyped JSON bodies are client errors, reported in the usual envelope.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra = Map::new();

        let (status, code, message) = match &self {
            AppError::Extraction(failure) => {
                extra.insert("attempts".into(), json!(failure.attempts));
                let status = if failure.reason == FailureReason::UnsupportedFormat {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                };
                (status, failure.reason.tag(), failure.remediation.clone())
            }
            AppError::PayloadTooLarge { limit } => {
                let message = if *limit > 0 {
                    format!(
                        "File is too large. The maximum upload size is {} MB.",
                        limit / (1024 * 1024)
                    )
                } else {
                    "File is too large.".to_string()
                };
                (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", message)
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PlaceholderText => (
                StatusCode::BAD_REQUEST,
                "PDF_EXTRACTION_FAILED",
                PLACEHOLDER_MESSAGE.to_string(),
            ),
            AppError::RateLimited => {
                extra.insert("retry_after".into(), json!(RATE_LIMIT_RETRY_AFTER_SECS));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMIT",
                    "API rate limit exceeded. Please wait a few minutes and try again.".to_string(),
                )
            }
            AppError::ApiKey(msg) => {
                tracing::error!("LLM API key error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "API_KEY_ERROR",
                    "API configuration issue. Please contact support.".to_string(),
                )
            }
            AppError::ContentBlocked(reason) => {
                tracing::warn!("LLM refused content: {reason}");
                (
                    StatusCode::BAD_REQUEST,
                    "CONTENT_ERROR",
                    "Resume content cannot be analyzed. Please ensure your resume contains \
                     appropriate professional content."
                        .to_string(),
                )
            }
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ANALYSIS_ERROR",
                    "Failed to analyze resume. Please check your resume content and try again."
                        .to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = Map::new();
        error.insert("code".into(), Value::from(code));
        error.insert("message".into(), Value::from(message));
        error.extend(extra);

        let body = Json(json!({ "error": error }));

        if matches!(self, AppError::RateLimited) {
            return (
                status,
                [(header::RETRY_AFTER, RATE_LIMIT_RETRY_AFTER_SECS.to_string())],
                body,
            )
                .into_response();
        }
        (status, body).into_response()
    }
}
