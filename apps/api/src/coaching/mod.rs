// Interview preparation and outreach message templates.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod prompts;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::repair::parse_model_json;
use crate::coaching::prompts::{
    COACHING_JSON_SYSTEM, FEEDBACK_PROMPT_TEMPLATE, FEEDBACK_SYSTEM, QUESTIONS_PROMPT_TEMPLATE,
    TEMPLATE_PROMPT_TEMPLATE,
};
use crate::llm_client::{LlmClient, LlmError, ResponseFormat};

pub const DEFAULT_QUESTION_COUNT: u32 = 5;
pub const MAX_QUESTION_COUNT: u32 = 20;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Z0-9_]+)\]").expect("valid regex"));

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum QuestionCategory {
    #[default]
    Behavioral,
    Technical,
    Situational,
    Company,
}

impl From<String> for QuestionCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "technical" => QuestionCategory::Technical,
            "situational" => QuestionCategory::Situational,
            "company" => QuestionCategory::Company,
            _ => QuestionCategory::Behavioral,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterviewQuestion {
    pub id: String,
    pub question: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub tips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Recruiter,
    Followup,
    Networking,
    Interview,
    Feedback,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Recruiter => "recruiter",
            TemplateKind::Followup => "followup",
            TemplateKind::Networking => "networking",
            TemplateKind::Interview => "interview",
            TemplateKind::Feedback => "feedback",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateCustomization {
    pub industry: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
    pub variables: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_interview_questions(
    llm: &LlmClient,
    industry: &str,
    role: &str,
    experience: &str,
    count: u32,
) -> Result<Vec<InterviewQuestion>, LlmError> {
    let prompt = QUESTIONS_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{experience}", experience)
        .replace("{role}", role)
        .replace("{industry}", industry);

    let raw = llm
        .call_text(&prompt, COACHING_JSON_SYSTEM, ResponseFormat::Json)
        .await?;
    let questions = normalize_questions(parse_model_json(&raw)?);
    info!(role, industry, count = questions.len(), "generated interview questions");
    Ok(questions)
}

pub async fn provide_feedback(
    llm: &LlmClient,
    question: &str,
    answer: &str,
    category: &str,
) -> Result<String, LlmError> {
    let prompt = FEEDBACK_PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{category}", category)
        .replace("{answer}", answer);
    let feedback = llm
        .call_text(&prompt, FEEDBACK_SYSTEM, ResponseFormat::Text)
        .await?;
    Ok(feedback.trim().to_string())
}

pub async fn generate_message_template(
    llm: &LlmClient,
    kind: TemplateKind,
    context: &str,
    customization: Option<&TemplateCustomization>,
) -> Result<MessageTemplate, LlmError> {
    let prompt = template_prompt(kind, context, customization);
    let raw = llm
        .call_text(&prompt, COACHING_JSON_SYSTEM, ResponseFormat::Json)
        .await?;
    let mut template: MessageTemplate = parse_model_json(&raw)?;
    if template.variables.is_empty() {
        template.variables = placeholder_variables(&template.body);
    }
    Ok(template)
}

fn template_prompt(
    kind: TemplateKind,
    context: &str,
    customization: Option<&TemplateCustomization>,
) -> String {
    let customization = customization
        .map(|c| {
            format!(
                "Industry: {}, Role: {}, Company: {}\n",
                c.industry.as_deref().unwrap_or("any"),
                c.role.as_deref().unwrap_or("any"),
                c.company.as_deref().unwrap_or("any"),
            )
        })
        .unwrap_or_default();
    TEMPLATE_PROMPT_TEMPLATE
        .replace("{kind}", kind.as_str())
        .replace("{customization}", &customization)
        .replace("{context}", context)
}

/// Drops empty questions and numbers any that came back without an id.
fn normalize_questions(questions: Vec<InterviewQuestion>) -> Vec<InterviewQuestion> {
    questions
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .enumerate()
        .map(|(i, mut q)| {
            if q.id.trim().is_empty() {
                q.id = format!("question-{}", i + 1);
            }
            q
        })
        .collect()
}

/// `[VARIABLE_NAME]` placeholders in order of first appearance.
fn placeholder_variables(body: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(body) {
        let name = &caps[1];
        if !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
    }
    variables
}
