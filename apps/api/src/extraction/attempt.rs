//! Per-attempt types shared by every extraction strategy.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::extraction::meets_threshold;

/// Identifies one self-contained extraction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    RawPattern,
    StructuredPdf,
    OfficeDocument,
    PlainText,
}

impl StrategyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyName::RawPattern => "raw_pattern",
            StrategyName::StructuredPdf => "structured_pdf",
            StrategyName::OfficeDocument => "office_document",
            StrategyName::PlainText => "plain_text",
        }
    }

    /// Human-readable label used in remediation messages.
    pub fn label(&self) -> &'static str {
        match self {
            StrategyName::RawPattern => "Simple text extraction",
            StrategyName::StructuredPdf => "Advanced PDF extraction",
            StrategyName::OfficeDocument => "Word document extraction",
            StrategyName::PlainText => "Text file reading",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure taxonomy. Raw engine errors never cross an extractor boundary;
/// they are mapped onto one of these first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    UnsupportedFormat,
    /// The heuristic scanner ran cleanly but found too little text.
    MinimalTextFound,
    /// A structured extractor parsed the document but it holds too little text
    /// (typically an image-only scan).
    InsufficientText,
    InvalidDocument,
    CorruptDocument,
    PasswordProtected,
    RuntimeInitError,
    TimedOut,
}

impl FailureReason {
    /// Machine-readable tag surfaced to API clients.
    pub fn tag(&self) -> &'static str {
        match self {
            FailureReason::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            FailureReason::MinimalTextFound => "MINIMAL_TEXT_FOUND",
            FailureReason::InsufficientText => "INSUFFICIENT_TEXT",
            FailureReason::InvalidDocument => "INVALID_DOCUMENT",
            FailureReason::CorruptDocument => "CORRUPT_DOCUMENT",
            FailureReason::PasswordProtected => "PASSWORD_PROTECTED",
            FailureReason::RuntimeInitError => "RUNTIME_INIT_ERROR",
            FailureReason::TimedOut => "TIMED_OUT",
        }
    }

    /// Short phrase for the "what we tried" list.
    pub fn describe(&self) -> &'static str {
        match self {
            FailureReason::UnsupportedFormat => "unsupported file type",
            FailureReason::MinimalTextFound => "found minimal text",
            FailureReason::InsufficientText => "not enough readable text",
            FailureReason::InvalidDocument => "invalid or damaged PDF structure",
            FailureReason::CorruptDocument => "file could not be unpacked",
            FailureReason::PasswordProtected => "document is password protected",
            FailureReason::RuntimeInitError => "extraction engine failed to start",
            FailureReason::TimedOut => "timed out on a complex document",
        }
    }

    /// Ran to completion but produced fewer characters than the viability threshold.
    pub fn is_below_threshold(&self) -> bool {
        matches!(
            self,
            FailureReason::MinimalTextFound | FailureReason::InsufficientText
        )
    }

    /// Whether trying another strategy on the same bytes can still help.
    /// No extractor can read protected content.
    pub fn allows_fallback(&self) -> bool {
        !matches!(
            self,
            FailureReason::PasswordProtected | FailureReason::UnsupportedFormat
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of running one strategy on one document. Lives only inside the orchestrator.
#[derive(Debug, Clone)]
pub struct ExtractionAttemptResult {
    pub strategy: StrategyName,
    pub text: String,
    pub character_count: usize,
    pub succeeded: bool,
    pub failure_reason: Option<FailureReason>,
    /// Engine detail for logs; never shown to users verbatim.
    pub detail: Option<String>,
    /// Set when a resource bound cut the document short.
    pub truncated: bool,
}

impl ExtractionAttemptResult {
    pub fn success(strategy: StrategyName, text: String) -> Self {
        let character_count = text.chars().count();
        Self {
            strategy,
            text,
            character_count,
            succeeded: true,
            failure_reason: None,
            detail: None,
            truncated: false,
        }
    }

    pub fn failure(strategy: StrategyName, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            strategy,
            text: String::new(),
            character_count: 0,
            succeeded: false,
            failure_reason: Some(reason),
            detail: Some(detail.into()),
            truncated: false,
        }
    }

    /// Accepts `text` when it meets `threshold`, otherwise records a below-threshold
    /// failure. Failed attempts keep their character count but drop the text so it can
    /// never leak out as a degraded success.
    pub fn evaluate(
        strategy: StrategyName,
        text: String,
        threshold: usize,
        below_threshold: FailureReason,
    ) -> Self {
        if meets_threshold(&text, threshold) {
            return Self::success(strategy, text);
        }
        let character_count = text.chars().count();
        Self {
            strategy,
            text: String::new(),
            character_count,
            succeeded: false,
            failure_reason: Some(below_threshold),
            detail: Some(format!(
                "{character_count} characters extracted, {threshold} required"
            )),
            truncated: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn summary(&self) -> AttemptSummary {
        AttemptSummary {
            strategy: self.strategy,
            succeeded: self.succeeded,
            character_count: self.character_count,
            failure_reason: self.failure_reason,
            truncated: self.truncated,
        }
    }
}

/// What the orchestrator keeps about an attempt once its text has been discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub strategy: StrategyName,
    pub succeeded: bool,
    pub character_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    pub truncated: bool,
}

/// A single extraction strategy. Implementations catch and classify their own
/// failures; `extract` never returns an unclassified error.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn strategy(&self) -> StrategyName;

    async fn extract(&self, bytes: Bytes) -> ExtractionAttemptResult;
}
