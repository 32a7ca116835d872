use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Full resume analysis as returned to clients. Every collection defaults to empty so a
/// partial model answer still deserializes; scores are clamped to 0..=100.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeAnalysis {
    pub file_name: String,
    pub analysis_id: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "score")]
    pub overall_score: u8,
    pub sections: AnalysisSections,
    pub recommendations: Vec<Recommendation>,
    pub next_steps: Vec<String>,
    pub career_roadmap: Option<CareerRoadmap>,
    pub skills_gap_table: Vec<SkillsGapRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSections {
    pub ats_compatibility: AtsAnalysis,
    pub skills_gaps: SkillsAnalysis,
    pub experience: ExperienceAnalysis,
    pub grammar: GrammarAnalysis,
    pub formatting: FormattingAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flaw_analysis: Option<FlawAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_rewrite: Option<ImpactAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_summary: Option<SummaryAnalysis>,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub issues: Vec<String>,
    pub improvements: Vec<String>,
    pub keywords: KeywordSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSet {
    pub missing: Vec<String>,
    pub present: Vec<String>,
    pub suggested: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub technical: TechnicalSkills,
    pub soft: SoftSkills,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalSkills {
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub trending: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftSkills {
    pub present: Vec<String>,
    pub missing: Vec<String>,
    pub important: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ExperienceLevel {
    #[default]
    Entry,
    Junior,
    Mid,
    Senior,
}

impl From<String> for ExperienceLevel {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "junior" => ExperienceLevel::Junior,
            "mid" | "mid-level" | "intermediate" => ExperienceLevel::Mid,
            "senior" | "lead" => ExperienceLevel::Senior,
            _ => ExperienceLevel::Entry,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub level: ExperienceLevel,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub suggestions: Vec<String>,
    pub project_ideas: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub errors: Vec<GrammarError>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarError {
    /// spelling, grammar or punctuation
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub issues: Vec<String>,
    pub positives: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlawAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub buzzwords: Buzzwords,
    pub weak_areas: Vec<WeakArea>,
    pub missing_metrics: Vec<String>,
    pub structural_issues: Vec<String>,
    pub honest_feedback: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Buzzwords {
    pub overused: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeakArea {
    pub area: String,
    pub issue: String,
    pub improvement: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImpactAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub current_issues: Vec<String>,
    pub rewrite_suggestions: Vec<RewriteSuggestion>,
    pub action_verb_suggestions: Vec<String>,
    pub quantification_tips: Vec<String>,
    pub achievement_highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteSuggestion {
    pub original: String,
    pub improved: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryAnalysis {
    #[serde(deserialize_with = "score")]
    pub score: u8,
    pub current_summary: String,
    #[serde(deserialize_with = "score")]
    pub hook_strength: u8,
    pub suggested_summary: String,
    pub impact_keywords: Vec<String>,
    pub improvements: Vec<String>,
    pub personal_branding: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendations and roadmap
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendation {
    pub id: String,
    /// ats, skills, experience, grammar, formatting, flaws, impact or summary
    pub category: String,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub actionable: String,
    pub time_estimate: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareerRoadmap {
    pub current_level: String,
    pub target_roles: Vec<String>,
    pub skill_progression: Vec<SkillProgression>,
    pub industry_trends: Vec<String>,
    pub certification_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillProgression {
    pub role: String,
    pub required_skills: Vec<String>,
    pub time_to_achieve: String,
    pub learning_path: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillsGapRow {
    pub role: String,
    pub industry: String,
    pub required_skills: Vec<RequiredSkill>,
    #[serde(deserialize_with = "score")]
    pub overall_match: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequiredSkill {
    pub skill: String,
    /// Critical, Important or Nice to Have
    pub importance: String,
    /// None, Beginner, Intermediate or Advanced
    pub current_level: String,
    /// High, Medium or Low
    pub gap: String,
    pub learning_resources: Vec<String>,
    pub time_to_learn: String,
}

/// Accepts a number, a numeric string, or null and clamps it into 0..=100.
fn score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// The model is asked to echo a placeholder here; anything unparseable is dropped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}
