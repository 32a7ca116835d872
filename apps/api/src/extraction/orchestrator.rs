//! The extraction pipeline controller.
//!
//! `NotStarted → FormatClassified → AttemptingStrategy(i) → Succeeded | AttemptingStrategy(i+1) | AllStrategiesExhausted`
//!
//! Strategies run strictly one after another. The first success wins; a failure that
//! allows fallback moves on to the next strategy. Only once every strategy has been
//! tried (or a non-recoverable reason stops the chain) is a single consolidated
//! failure produced.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extraction::attempt::{AttemptSummary, ExtractionAttemptResult, Extractor, FailureReason, StrategyName};
use crate::extraction::classifier::classify;
use crate::extraction::document::UploadedDocument;
use crate::extraction::office::OfficeExtractor;
use crate::extraction::plain_text::PlainTextExtractor;
use crate::extraction::raw_pattern::RawPatternExtractor;
use crate::extraction::remediation::remediation_for;
use crate::extraction::structured_pdf::StructuredPdfExtractor;
use crate::extraction::ExtractionLimits;

/// Text accepted from one strategy, with the trail of attempts that led to it.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub strategy: StrategyName,
    /// A resource bound cut the document short; the text covers a prefix only.
    pub truncated: bool,
    pub attempts: Vec<AttemptSummary>,
}

/// Terminal failure: a taxonomy tag plus guidance the user can act on.
#[derive(Debug, Clone, Error)]
#[error("{reason}: {remediation}")]
pub struct ExtractionFailure {
    pub reason: FailureReason,
    pub remediation: String,
    pub attempts: Vec<AttemptSummary>,
}

pub type ExtractionOutcome = Result<ExtractedText, ExtractionFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    NotStarted,
    FormatClassified,
    AttemptingStrategy(usize),
    Succeeded,
    AllStrategiesExhausted,
}

pub struct ExtractionOrchestrator {
    extractors: HashMap<StrategyName, Arc<dyn Extractor>>,
}

impl ExtractionOrchestrator {
    /// Registers the default extractor for every strategy.
    pub fn new(limits: ExtractionLimits) -> Self {
        Self::with_extractors(vec![
            Arc::new(RawPatternExtractor::new(limits)) as Arc<dyn Extractor>,
            Arc::new(StructuredPdfExtractor::new(limits)),
            Arc::new(OfficeExtractor::new()),
            Arc::new(PlainTextExtractor::new()),
        ])
    }

    /// Later entries replace earlier ones registered for the same strategy.
    pub fn with_extractors(extractors: Vec<Arc<dyn Extractor>>) -> Self {
        let extractors = extractors
            .into_iter()
            .map(|extractor| (extractor.strategy(), extractor))
            .collect();
        Self { extractors }
    }

    /// Produces exactly one outcome for `document`.
    pub async fn extract(&self, document: &UploadedDocument) -> ExtractionOutcome {
        let mut state = PipelineState::NotStarted;

        let set = match classify(document) {
            Ok(set) => set,
            Err(e) => {
                warn!(file = %document.file_name(), mime = %e.mime, "rejecting unsupported upload type");
                return Err(ExtractionFailure {
                    reason: FailureReason::UnsupportedFormat,
                    remediation: remediation_for(None, FailureReason::UnsupportedFormat, &[]),
                    attempts: Vec::new(),
                });
            }
        };
        advance(&mut state, PipelineState::FormatClassified);
        debug!(
            file = %document.file_name(),
            size_bytes = document.size_bytes(),
            format = ?set.format,
            fallback = set.has_fallback(),
            "document classified"
        );

        let mut attempts = Vec::with_capacity(set.strategies.len());
        for (index, &strategy) in set.strategies.iter().enumerate() {
            advance(&mut state, PipelineState::AttemptingStrategy(index));

            let attempt = match self.extractors.get(&strategy) {
                Some(extractor) => {
                    let started = Instant::now();
                    let attempt = extractor.extract(document.bytes().clone()).await;
                    info!(
                        file = %document.file_name(),
                        %strategy,
                        succeeded = attempt.succeeded,
                        characters = attempt.character_count,
                        reason = ?attempt.failure_reason,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "extraction attempt finished"
                    );
                    attempt
                }
                None => ExtractionAttemptResult::failure(
                    strategy,
                    FailureReason::RuntimeInitError,
                    "no extractor registered",
                ),
            };
            if let Some(detail) = &attempt.detail {
                debug!(%strategy, "attempt detail: {detail}");
            }

            attempts.push(attempt.summary());
            if attempt.succeeded {
                advance(&mut state, PipelineState::Succeeded);
                return Ok(ExtractedText {
                    text: attempt.text,
                    strategy,
                    truncated: attempt.truncated,
                    attempts,
                });
            }
            if attempt.failure_reason.is_some_and(|reason| !reason.allows_fallback()) {
                break;
            }
        }

        advance(&mut state, PipelineState::AllStrategiesExhausted);
        let reason = consolidate(&attempts);
        warn!(
            file = %document.file_name(),
            %reason,
            attempts = attempts.len(),
            "extraction failed"
        );
        Err(ExtractionFailure {
            reason,
            remediation: remediation_for(Some(set.format), reason, &attempts),
            attempts,
        })
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug!(from = ?state, to = ?next, "extraction state");
    *state = next;
}

/// Picks the one reason reported for a failed document. A lone attempt reports its own
/// reason; across several, structural and protection problems outrank "too little
/// text", which outranks engine start-up trouble.
fn consolidate(attempts: &[AttemptSummary]) -> FailureReason {
    let reasons: Vec<FailureReason> = attempts.iter().filter_map(|a| a.failure_reason).collect();
    if let [only] = reasons.as_slice() {
        return *only;
    }

    const PRIORITY: [FailureReason; 4] = [
        FailureReason::PasswordProtected,
        FailureReason::InvalidDocument,
        FailureReason::CorruptDocument,
        FailureReason::TimedOut,
    ];
    if let Some(reason) = PRIORITY.into_iter().find(|p| reasons.contains(p)) {
        return reason;
    }
    if reasons.iter().any(FailureReason::is_below_threshold) {
        return FailureReason::MinimalTextFound;
    }
    reasons.last().copied().unwrap_or(FailureReason::RuntimeInitError)
}
