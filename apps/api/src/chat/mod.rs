//! Career chat assistant: one LLM turn per request, with a short conversation window.
//!
//! The model is asked for plain prose; whatever markdown it still produces is stripped
//! before the answer reaches the client, and overly long answers are cut.

pub mod handlers;
pub mod prompts;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::chat::prompts::{CHAT_PROMPT_TEMPLATE, NOT_SPECIFIED};

/// Messages of prior conversation sent along with a new one.
pub const CONTEXT_WINDOW: usize = 5;

/// Longest answer, in characters, returned to the client.
pub const MAX_RESPONSE_CHARS: usize = 1200;

pub const FALLBACK_RESPONSE: &str =
    "I'm sorry, I'm having trouble responding right now. Please try asking again!";

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[*\-+][ \t]+").expect("valid regex"));
static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    pub industry: Option<String>,
    pub experience: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Builds the user turn from profile, recent history and the new message.
pub fn build_chat_prompt(message: &str, context: &[ChatMessage], user_info: Option<&UserInfo>) -> String {
    let user_context = user_info
        .map(|info| {
            let goals = if info.goals.is_empty() {
                NOT_SPECIFIED.to_string()
            } else {
                info.goals.join(", ")
            };
            format!(
                "User context - Industry: {}, Experience: {}, Goals: {goals}\n\n",
                or_not_specified(info.industry.as_deref()),
                or_not_specified(info.experience.as_deref()),
            )
        })
        .unwrap_or_default();

    let recent = &context[context.len().saturating_sub(CONTEXT_WINDOW)..];
    let history = if recent.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = recent
            .iter()
            .map(|msg| format!("{}: {}", msg.role.as_str(), msg.content))
            .collect();
        format!("Previous conversation:\n{}\n\n", lines.join("\n"))
    };

    CHAT_PROMPT_TEMPLATE
        .replace("{user_context}", &user_context)
        .replace("{history}", &history)
        .replace("{message}", message)
}

/// Strips markdown emphasis, bullets and headers, then caps the length.
pub fn clean_response(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = BULLET.replace_all(&text, "");
    let text = HEADER.replace_all(&text, "");
    let text = text.trim();

    if text.chars().count() > MAX_RESPONSE_CHARS {
        let cut: String = text.chars().take(MAX_RESPONSE_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn or_not_specified(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SPECIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_clean_response_strips_markdown() {
        let raw = "## Next steps\n\n**Tailor** your resume.\n- Add *metrics*\n* Practice interviews\n+ Network";
        assert_eq!(
            clean_response(raw),
            "Next steps\n\nTailor your resume.\nAdd metrics\nPractice interviews\nNetwork"
        );
    }

    #[test]
    fn test_clean_response_keeps_hyphenated_words() {
        assert_eq!(clean_response("A well-known tip"), "A well-known tip");
    }

    #[test]
    fn test_clean_response_truncates() {
        let long = "a".repeat(MAX_RESPONSE_CHARS + 50);
        let cleaned = clean_response(&long);
        assert_eq!(cleaned.chars().count(), MAX_RESPONSE_CHARS + 3);
        assert!(cleaned.ends_with("..."));

        let exact = "b".repeat(MAX_RESPONSE_CHARS);
        assert_eq!(clean_response(&exact), exact);
    }

    #[test]
    fn test_prompt_includes_user_context_defaults() {
        let info = UserInfo {
            industry: Some("Fintech".into()),
            experience: None,
            goals: vec!["Land an internship".into(), "Learn Rust".into()],
        };
        let prompt = build_chat_prompt("How do I start?", &[], Some(&info));
        assert!(prompt.starts_with(
            "User context - Industry: Fintech, Experience: Not specified, Goals: Land an internship, Learn Rust\n\n"
        ));
        assert!(prompt.ends_with("User message: How do I start?"));
        assert!(!prompt.contains("Previous conversation"));
    }

    #[test]
    fn test_prompt_keeps_last_five_messages() {
        let context: Vec<ChatMessage> = (1..=7)
            .map(|i| {
                let role = if i % 2 == 1 { ChatRole::User } else { ChatRole::Assistant };
                msg(role, &format!("turn {i}"))
            })
            .collect();
        let prompt = build_chat_prompt("next", &context, None);
        assert!(!prompt.contains("turn 2\n"));
        assert!(prompt.contains("Previous conversation:\nuser: turn 3\nassistant: turn 4"));
        assert!(prompt.contains("user: turn 7\n\nUser message: next"));
    }
}
