// Document text extraction: turns an uploaded resume (PDF, DOCX, DOC, TXT) into plain
// text for the analysis provider. Strategies are tried strictly in order; CPU-bound
// work runs inside tokio::task::spawn_blocking.

pub mod attempt;
pub mod classifier;
pub mod document;
pub mod office;
pub mod orchestrator;
pub mod plain_text;
pub mod raw_pattern;
pub mod remediation;
pub mod structured_pdf;

use std::time::Duration;

pub use attempt::{AttemptSummary, ExtractionAttemptResult, Extractor, FailureReason, StrategyName};
pub use classifier::{classify, DocumentFormat, StrategySet, UnsupportedFormatError};
pub use document::{ByteReader, UploadedDocument};
pub use orchestrator::{ExtractedText, ExtractionFailure, ExtractionOrchestrator, ExtractionOutcome};

/// Minimum character count for extracted text to count as a successful attempt.
/// Shared by every PDF and office strategy.
pub const MIN_VIABLE_TEXT_CHARS: usize = 50;

/// Plain-text uploads need no recovery, so they only have to be non-trivial.
pub const MIN_PLAIN_TEXT_CHARS: usize = 10;

/// Resource bounds applied to a single extraction call.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    /// Bytes decoded per raw-scan chunk.
    pub raw_chunk_bytes: usize,
    /// Total bytes the raw scanner will look at; the rest of the file is ignored.
    pub raw_scan_cap_bytes: usize,
    /// Pages the structured extractor will read before stopping.
    pub max_pages: usize,
    /// Wall-clock budget for one structured extraction.
    pub structured_timeout: Duration,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            raw_chunk_bytes: 100_000,
            raw_scan_cap_bytes: 2_000_000,
            max_pages: 10,
            structured_timeout: Duration::from_secs(30),
        }
    }
}

/// True when `text` carries at least `threshold` characters (not bytes).
pub fn meets_threshold(text: &str, threshold: usize) -> bool {
    text.chars().count() >= threshold
}
