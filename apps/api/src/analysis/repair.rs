//! Lenient parsing of model-produced JSON.
//!
//! The model is told to answer with JSON only, but answers still arrive wrapped in prose,
//! with trailing commas, or with typographic quotes. Parsing is strict first; on failure a
//! single repair pass runs and the result is parsed once more. There is no second repair.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::models::ResumeAnalysis;
use crate::llm_client::{strip_json_fences, LlmError};

#[derive(Debug, Error)]
pub enum AnalysisParseError {
    #[error("model returned an empty answer")]
    Empty,

    #[error("model returned malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl From<AnalysisParseError> for LlmError {
    fn from(err: AnalysisParseError) -> Self {
        match err {
            AnalysisParseError::Empty => LlmError::EmptyContent,
            AnalysisParseError::Malformed(e) => LlmError::Parse(e),
        }
    }
}

pub fn parse_analysis(raw: &str) -> Result<ResumeAnalysis, AnalysisParseError> {
    parse_model_json(raw)
}

/// Strict parse, then at most one repaired parse.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, AnalysisParseError> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Err(AnalysisParseError::Empty);
    }

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            debug!("strict JSON parse failed ({strict_err}), attempting repair");
            let repaired = repair_json(text);
            serde_json::from_str(&repaired).map_err(|e| {
                warn!("JSON still malformed after repair: {e}");
                AnalysisParseError::Malformed(e)
            })
        }
    }
}

/// One bounded repair pass: keep only the outermost JSON value, normalise typographic
/// quotes, and drop trailing commas.
pub fn repair_json(text: &str) -> String {
    let body = outermost_value(text).unwrap_or(text);
    let normalised: String = body
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();
    strip_trailing_commas(&normalised)
}

/// Slice from the first `{` or `[` to the last matching closer.
fn outermost_value(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// Removes commas that directly precede `}` or `]`, ignoring string contents.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
