//! Structured PDF extraction: parses the document model page by page.
//!
//! Two engines are available. The direct engine (lopdf) walks the page tree itself.
//! The assisted engine (pdf-extract) brings its own font and layout handling and is
//! only consulted when the direct engine cannot start at all; a direct engine that
//! starts and finds little text is a real answer, not a reason to retry.
//!
//! The whole attempt runs on the blocking pool under a wall-clock budget. When the
//! budget elapses the attempt reports `TimedOut` and a shared cancel flag tells the
//! engine to stop at the next page boundary.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::attempt::{ExtractionAttemptResult, Extractor, FailureReason, StrategyName};
use crate::extraction::{ExtractionLimits, MIN_VIABLE_TEXT_CHARS};

/// How far into the file the `%PDF-` marker may appear.
const HEADER_SEARCH_BYTES: usize = 1024;

// ────────────────────────────────────────────────────────────────────────────
// Engines
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// Page texts joined with newlines.
    pub text: String,
    pub page_count: usize,
    pub pages_read: usize,
    pub pages_skipped: usize,
    /// The trailer carries an `/Encrypt` entry.
    pub encrypted: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineFailure {
    #[error("document is encrypted: {0}")]
    Encrypted(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("engine failed to initialize: {0}")]
    Init(String),

    #[error("cancelled")]
    Cancelled,
}

/// A synchronous PDF text engine. Called from the blocking pool.
pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reads at most `max_pages` pages. Implementations check `cancel` between pages.
    fn read_pages(
        &self,
        bytes: &[u8],
        max_pages: usize,
        cancel: &AtomicBool,
    ) -> Result<EngineOutput, EngineFailure>;
}

/// Walks the page tree with lopdf.
pub struct LopdfEngine;

impl PdfEngine for LopdfEngine {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn read_pages(
        &self,
        bytes: &[u8],
        max_pages: usize,
        cancel: &AtomicBool,
    ) -> Result<EngineOutput, EngineFailure> {
        let doc = match panic::catch_unwind(AssertUnwindSafe(|| lopdf::Document::load_mem(bytes))) {
            Ok(Ok(doc)) => doc,
            Ok(Err(e)) => return Err(classify_load_error(&e.to_string())),
            Err(payload) => return Err(EngineFailure::Init(panic_message(payload))),
        };

        let encrypted = doc.trailer.get(b"Encrypt").is_ok();
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(EngineFailure::Malformed("document has no pages".into()));
        }

        let mut output = EngineOutput {
            page_count: pages.len(),
            encrypted,
            ..EngineOutput::default()
        };
        let mut page_texts = Vec::new();

        for &page_number in pages.keys().take(max_pages) {
            if cancel.load(Ordering::Relaxed) {
                return Err(EngineFailure::Cancelled);
            }
            match panic::catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[page_number]))) {
                Ok(Ok(text)) => {
                    let page = normalize_page(&text);
                    if !page.is_empty() {
                        page_texts.push(page);
                    }
                    output.pages_read += 1;
                }
                Ok(Err(e)) => {
                    warn!(page = page_number, "skipping unreadable page: {e}");
                    output.pages_skipped += 1;
                }
                Err(payload) => {
                    warn!(page = page_number, "page extraction panicked: {}", panic_message(payload));
                    output.pages_skipped += 1;
                }
            }
        }

        output.text = page_texts.join("\n");
        Ok(output)
    }
}

/// Delegates to pdf-extract, which resolves fonts and layout on its own.
pub struct PdfExtractEngine;

impl PdfEngine for PdfExtractEngine {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn read_pages(
        &self,
        bytes: &[u8],
        max_pages: usize,
        cancel: &AtomicBool,
    ) -> Result<EngineOutput, EngineFailure> {
        let pages = match panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        })) {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => return Err(classify_load_error(&e.to_string())),
            Err(payload) => return Err(EngineFailure::Init(panic_message(payload))),
        };
        if cancel.load(Ordering::Relaxed) {
            return Err(EngineFailure::Cancelled);
        }
        if pages.is_empty() {
            return Err(EngineFailure::Malformed("document has no pages".into()));
        }

        let pages_read = pages.len().min(max_pages);
        let page_texts: Vec<String> = pages
            .iter()
            .take(max_pages)
            .map(|text| normalize_page(text))
            .filter(|page| !page.is_empty())
            .collect();

        Ok(EngineOutput {
            page_count: pages.len(),
            pages_read,
            text: page_texts.join("\n"),
            ..EngineOutput::default()
        })
    }
}

/// Trims every line and joins the non-empty ones with single spaces.
fn normalize_page(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn classify_load_error(message: &str) -> EngineFailure {
    let lower = message.to_lowercase();
    if ["password", "encrypt", "decrypt"].iter().any(|term| lower.contains(term)) {
        EngineFailure::Encrypted(message.to_string())
    } else {
        EngineFailure::Malformed(message.to_string())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(HEADER_SEARCH_BYTES)]
        .windows(5)
        .any(|window| window == b"%PDF-")
}

fn run_engines(
    direct: &dyn PdfEngine,
    assisted: Option<&dyn PdfEngine>,
    bytes: &[u8],
    max_pages: usize,
    cancel: &AtomicBool,
) -> Result<EngineOutput, EngineFailure> {
    match direct.read_pages(bytes, max_pages, cancel) {
        Err(EngineFailure::Init(detail)) => {
            let Some(assisted) = assisted else {
                return Err(EngineFailure::Init(detail));
            };
            warn!(
                engine = direct.name(),
                fallback = assisted.name(),
                "direct engine failed to initialize: {detail}"
            );
            assisted.read_pages(bytes, max_pages, cancel)
        }
        other => other,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy
// ────────────────────────────────────────────────────────────────────────────

pub struct StructuredPdfExtractor {
    direct: Arc<dyn PdfEngine>,
    assisted: Option<Arc<dyn PdfEngine>>,
    limits: ExtractionLimits,
    threshold: usize,
}

impl StructuredPdfExtractor {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self::with_engines(Arc::new(LopdfEngine), Some(Arc::new(PdfExtractEngine)), limits)
    }

    pub fn with_engines(
        direct: Arc<dyn PdfEngine>,
        assisted: Option<Arc<dyn PdfEngine>>,
        limits: ExtractionLimits,
    ) -> Self {
        Self {
            direct,
            assisted,
            limits,
            threshold: MIN_VIABLE_TEXT_CHARS,
        }
    }

    fn classify_output(&self, output: EngineOutput) -> ExtractionAttemptResult {
        let truncated = output.pages_read + output.pages_skipped < output.page_count;
        debug!(
            pages = output.page_count,
            read = output.pages_read,
            skipped = output.pages_skipped,
            truncated,
            "structured extraction finished"
        );

        let attempt = ExtractionAttemptResult::evaluate(
            StrategyName::StructuredPdf,
            output.text.trim().to_string(),
            self.threshold,
            FailureReason::InsufficientText,
        )
        .with_truncated(truncated);

        // Pages that parsed were decrypted with the empty user password.
        if !attempt.succeeded && output.encrypted && output.pages_read == 0 {
            return ExtractionAttemptResult::failure(
                StrategyName::StructuredPdf,
                FailureReason::PasswordProtected,
                "encrypted document yielded no readable text",
            );
        }
        attempt
    }
}

#[async_trait]
impl Extractor for StructuredPdfExtractor {
    fn strategy(&self) -> StrategyName {
        StrategyName::StructuredPdf
    }

    async fn extract(&self, bytes: Bytes) -> ExtractionAttemptResult {
        if !has_pdf_header(&bytes) {
            return ExtractionAttemptResult::failure(
                StrategyName::StructuredPdf,
                FailureReason::InvalidDocument,
                "missing %PDF- header",
            );
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let task = {
            let direct = Arc::clone(&self.direct);
            let assisted = self.assisted.clone();
            let cancel = Arc::clone(&cancel);
            let max_pages = self.limits.max_pages;
            tokio::task::spawn_blocking(move || {
                run_engines(direct.as_ref(), assisted.as_deref(), &bytes, max_pages, &cancel)
            })
        };

        let budget = self.limits.structured_timeout;
        match tokio::time::timeout(budget, task).await {
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                warn!(?budget, "structured extraction timed out");
                ExtractionAttemptResult::failure(
                    StrategyName::StructuredPdf,
                    FailureReason::TimedOut,
                    format!("no result within {budget:?}"),
                )
            }
            Ok(Err(e)) => ExtractionAttemptResult::failure(
                StrategyName::StructuredPdf,
                FailureReason::RuntimeInitError,
                format!("extraction task failed: {e}"),
            ),
            Ok(Ok(Err(failure))) => {
                let reason = match failure {
                    EngineFailure::Encrypted(_) => FailureReason::PasswordProtected,
                    EngineFailure::Malformed(_) => FailureReason::InvalidDocument,
                    EngineFailure::Init(_) => FailureReason::RuntimeInitError,
                    EngineFailure::Cancelled => FailureReason::TimedOut,
                };
                ExtractionAttemptResult::failure(StrategyName::StructuredPdf, reason, failure.to_string())
            }
            Ok(Ok(Ok(output))) => self.classify_output(output),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    /// Builds a PDF with one page per entry in `pages`, each showing its text with Tj.
    pub(crate) fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = if text.is_empty() {
                String::new()
            } else {
                format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    const LONG_LINE: &str = "Jane Doe Senior Software Engineer with eight years of backend experience";

    struct FnEngine<F>(F);

    impl<F> PdfEngine for FnEngine<F>
    where
        F: Fn(&AtomicBool) -> Result<EngineOutput, EngineFailure> + Send + Sync,
    {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn read_pages(
            &self,
            _bytes: &[u8],
            _max_pages: usize,
            cancel: &AtomicBool,
        ) -> Result<EngineOutput, EngineFailure> {
            (self.0)(cancel)
        }
    }

    fn engine<F>(f: F) -> Arc<dyn PdfEngine>
    where
        F: Fn(&AtomicBool) -> Result<EngineOutput, EngineFailure> + Send + Sync + 'static,
    {
        Arc::new(FnEngine(f))
    }

    fn text_output(text: &str) -> EngineOutput {
        EngineOutput {
            text: text.to_string(),
            page_count: 1,
            pages_read: 1,
            ..EngineOutput::default()
        }
    }

    fn stub_pdf() -> Bytes {
        Bytes::from_static(b"%PDF-1.7\n% stub body\n")
    }

    #[tokio::test]
    async fn test_extracts_generated_pdf() {
        let extractor = StructuredPdfExtractor::new(ExtractionLimits::default());
        let bytes = make_test_pdf(&[LONG_LINE]);
        let attempt = extractor.extract(Bytes::from(bytes)).await;
        assert!(attempt.succeeded, "attempt failed: {:?}", attempt.detail);
        assert!(attempt.text.contains("Jane"));
        assert!(!attempt.truncated);
    }

    #[tokio::test]
    async fn test_page_cap_marks_truncated() {
        let limits = ExtractionLimits {
            max_pages: 2,
            ..ExtractionLimits::default()
        };
        let extractor = StructuredPdfExtractor::new(limits);
        let bytes = make_test_pdf(&[LONG_LINE, LONG_LINE, "Unreachable third page text"]);
        let attempt = extractor.extract(Bytes::from(bytes)).await;
        assert!(attempt.succeeded, "attempt failed: {:?}", attempt.detail);
        assert!(attempt.truncated);
        assert!(!attempt.text.contains("Unreachable"));
    }

    #[tokio::test]
    async fn test_image_only_pdf_is_insufficient_text() {
        let extractor = StructuredPdfExtractor::new(ExtractionLimits::default());
        let bytes = make_test_pdf(&[""]);
        let attempt = extractor.extract(Bytes::from(bytes)).await;
        assert!(!attempt.succeeded);
        assert_eq!(attempt.failure_reason, Some(FailureReason::InsufficientText));
    }

    #[tokio::test]
    async fn test_blank_pages_do_not_count_toward_threshold() {
        let below = "Jane Doe Backend Engineer: Rust Go Kubernetes AWS";
        assert_eq!(below.chars().count(), MIN_VIABLE_TEXT_CHARS - 1);
        let extractor = StructuredPdfExtractor::new(ExtractionLimits::default());

        let attempt = extractor
            .extract(Bytes::from(make_test_pdf(&["", below])))
            .await;
        assert!(!attempt.succeeded);
        assert_eq!(attempt.failure_reason, Some(FailureReason::InsufficientText));
        assert_eq!(attempt.character_count, MIN_VIABLE_TEXT_CHARS - 1);

        let exact = format!("{below}.");
        let attempt = extractor
            .extract(Bytes::from(make_test_pdf(&["", &exact, ""])))
            .await;
        assert!(attempt.succeeded, "attempt failed: {:?}", attempt.detail);
        assert_eq!(attempt.text, exact);
    }

    #[tokio::test]
    async fn test_stub_output_is_trimmed_before_threshold() {
        let padded = format!("\n\n{}  \n", &LONG_LINE[..MIN_VIABLE_TEXT_CHARS - 1]);
        let extractor = StructuredPdfExtractor::with_engines(
            engine(move |_| Ok(text_output(&padded))),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::InsufficientText));
    }

    #[tokio::test]
    async fn test_missing_header_is_invalid() {
        let extractor = StructuredPdfExtractor::new(ExtractionLimits::default());
        let attempt = extractor.extract(Bytes::from_static(b"not a pdf at all")).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::InvalidDocument));
    }

    #[tokio::test]
    async fn test_damaged_pdf_fails_without_panicking() {
        let extractor = StructuredPdfExtractor::new(ExtractionLimits::default());
        let attempt = extractor
            .extract(Bytes::from_static(b"%PDF-1.4\nthis is not an object graph"))
            .await;
        assert!(!attempt.succeeded);
        assert!(attempt.text.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_maps_to_invalid_document() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| Err(EngineFailure::Malformed("bad xref".into()))),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::InvalidDocument));
    }

    #[tokio::test]
    async fn test_encrypted_maps_to_password_protected() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| Err(EngineFailure::Encrypted("incorrect password".into()))),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::PasswordProtected));
    }

    #[tokio::test]
    async fn test_encrypted_trailer_with_unreadable_pages_is_password_protected() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| {
                Ok(EngineOutput {
                    encrypted: true,
                    page_count: 2,
                    pages_skipped: 2,
                    ..EngineOutput::default()
                })
            }),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::PasswordProtected));
    }

    #[tokio::test]
    async fn test_decrypted_document_with_little_text_is_insufficient() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| {
                Ok(EngineOutput {
                    encrypted: true,
                    ..text_output("Jane Doe")
                })
            }),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::InsufficientText));
    }

    #[tokio::test]
    async fn test_init_failure_uses_assisted_engine() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| Err(EngineFailure::Init("worker unavailable".into()))),
            Some(engine(|_| Ok(text_output(LONG_LINE)))),
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert!(attempt.succeeded);
        assert_eq!(attempt.text, LONG_LINE);
    }

    #[tokio::test]
    async fn test_low_text_does_not_use_assisted_engine() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| Ok(text_output("short"))),
            Some(engine(|_| Ok(text_output(LONG_LINE)))),
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::InsufficientText));
    }

    #[tokio::test]
    async fn test_init_failure_without_fallback_is_runtime_error() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| Err(EngineFailure::Init("boom".into()))),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::RuntimeInitError));
    }

    #[tokio::test]
    async fn test_panicking_engine_is_classified() {
        let extractor = StructuredPdfExtractor::with_engines(
            engine(|_| panic!("engine exploded")),
            None,
            ExtractionLimits::default(),
        );
        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::RuntimeInitError));
    }

    #[tokio::test]
    async fn test_timeout_sets_cancel_flag() {
        let observed = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&observed);
        let slow = engine(move |cancel| {
            while !cancel.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(5));
            }
            seen.store(true, Ordering::Relaxed);
            Err(EngineFailure::Cancelled)
        });
        let limits = ExtractionLimits {
            structured_timeout: Duration::from_millis(50),
            ..ExtractionLimits::default()
        };
        let extractor = StructuredPdfExtractor::with_engines(slow, None, limits);

        let attempt = extractor.extract(stub_pdf()).await;
        assert_eq!(attempt.failure_reason, Some(FailureReason::TimedOut));
        assert!(attempt.text.is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(observed.load(Ordering::Relaxed));
    }

    #[test]
    fn test_classify_load_error() {
        assert!(matches!(
            classify_load_error("Decryption error: wrong password"),
            EngineFailure::Encrypted(_)
        ));
        assert!(matches!(
            classify_load_error("invalid cross-reference table"),
            EngineFailure::Malformed(_)
        ));
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(normalize_page("  Jane Doe \n\n  Engineer  \n"), "Jane Doe Engineer");
    }

    #[test]
    fn test_header_may_follow_leading_bytes() {
        assert!(has_pdf_header(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!has_pdf_header(b"PDF-1.4"));
    }
}
