use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::coaching::{
    generate_interview_questions, generate_message_template, provide_feedback, InterviewQuestion,
    MessageTemplate, TemplateCustomization, TemplateKind, DEFAULT_QUESTION_COUNT,
    MAX_QUESTION_COUNT,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub experience: String,
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[serde(default)]
    pub context: String,
    pub customization: Option<TemplateCustomization>,
}

/// POST /api/interview/questions
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    payload: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<Json<Vec<InterviewQuestion>>, AppError> {
    let Json(req) = payload?;
    if [&req.industry, &req.role, &req.experience]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        return Err(AppError::Validation(
            "Industry, role and experience are required".to_string(),
        ));
    }
    let count = req.count.unwrap_or(DEFAULT_QUESTION_COUNT);
    if !(1..=MAX_QUESTION_COUNT).contains(&count) {
        return Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_QUESTION_COUNT}"
        )));
    }

    let llm = state.require_llm()?;
    let questions =
        generate_interview_questions(llm, &req.industry, &req.role, &req.experience, count).await?;
    Ok(Json(questions))
}

/// POST /api/interview/feedback
pub async fn handle_interview_feedback(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let Json(req) = payload?;
    if req.question.trim().is_empty() || req.answer.trim().is_empty() {
        return Err(AppError::Validation(
            "Question and answer are required".to_string(),
        ));
    }
    let category = if req.category.trim().is_empty() {
        "general"
    } else {
        req.category.as_str()
    };

    let llm = state.require_llm()?;
    let feedback = provide_feedback(llm, &req.question, &req.answer, category).await?;
    Ok(Json(FeedbackResponse { feedback }))
}

/// POST /api/templates
pub async fn handle_message_template(
    State(state): State<AppState>,
    payload: Result<Json<TemplateRequest>, JsonRejection>,
) -> Result<Json<MessageTemplate>, AppError> {
    let Json(req) = payload?;
    if req.context.trim().is_empty() {
        return Err(AppError::Validation("Template context is required".to_string()));
    }

    let llm = state.require_llm()?;
    let template =
        generate_message_template(llm, req.kind, &req.context, req.customization.as_ref()).await?;
    Ok(Json(template))
}
