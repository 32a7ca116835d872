//! User-facing guidance attached to a failed extraction.

use crate::extraction::attempt::{AttemptSummary, FailureReason};
use crate::extraction::classifier::DocumentFormat;

const UNSUPPORTED: &str =
    "Unsupported file type. Please upload PDF, Word (.docx), or text (.txt) files.";

const PASSWORD: &str = "This document is password protected. Remove the password (for example \
     by printing it to a new PDF or saving an unprotected copy) and upload it again.";

const QUICK_SOLUTIONS: &str = "Quick solutions:
1. Copy and paste: open the file, select all text (Ctrl+A or Cmd+A), paste it into a new .txt file and upload that file.
2. Convert to a Word document: export the file as .docx and upload the .docx instead.
3. Create a text-based PDF: open your resume in Word or Google Docs and use \"Save as PDF\" or \"Print to PDF\".";

/// Builds the remediation text for a failure. Composite failures (every PDF strategy
/// tried) list what was attempted before the suggestions.
pub fn remediation_for(
    format: Option<DocumentFormat>,
    reason: FailureReason,
    attempts: &[AttemptSummary],
) -> String {
    match (reason, format) {
        (FailureReason::UnsupportedFormat, _) | (_, None) => UNSUPPORTED.to_string(),
        (FailureReason::PasswordProtected, _) => PASSWORD.to_string(),
        (_, Some(DocumentFormat::Pdf)) => composite_pdf(reason, attempts),
        (_, Some(DocumentFormat::Docx | DocumentFormat::Doc)) => word_document(reason),
        (_, Some(DocumentFormat::PlainText)) => plain_text(),
    }
}

fn composite_pdf(reason: FailureReason, attempts: &[AttemptSummary]) -> String {
    let lead = match reason {
        FailureReason::InvalidDocument | FailureReason::CorruptDocument => {
            "This PDF appears to be damaged or is not a valid PDF file."
        }
        FailureReason::TimedOut => "This PDF is too complex to read in the time available.",
        _ => "This PDF appears to contain mostly images or text we could not read.",
    };

    let tried: Vec<String> = attempts
        .iter()
        .map(|attempt| {
            let outcome = attempt
                .failure_reason
                .map(|r| r.describe())
                .unwrap_or("failed");
            format!("• {}: {outcome}", attempt.strategy.label())
        })
        .collect();

    format!(
        "{lead}\n\nWhat we tried:\n{}\n\n{QUICK_SOLUTIONS}\n\n\
         Common causes: scanned pages with no selectable text, unusual font encodings, or file corruption.",
        tried.join("\n")
    )
}

fn word_document(reason: FailureReason) -> String {
    let lead = match reason {
        FailureReason::CorruptDocument => {
            "Failed to extract text from Word document. The file could not be opened and may be damaged."
        }
        _ => "Failed to extract text from Word document. It does not contain enough readable text.",
    };
    format!(
        "{lead}\n\nPlease try:\n\
         • Re-saving the document as .docx from Word or Google Docs\n\
         • Saving it as a text-based PDF\n\
         • Copying the text and pasting it into a .txt file"
    )
}

fn plain_text() -> String {
    "The text file is empty or too short to analyze. Paste your full resume into the file, \
     or upload it as a Word (.docx) document or PDF instead."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::attempt::StrategyName;

    fn failed(strategy: StrategyName, reason: FailureReason) -> AttemptSummary {
        AttemptSummary {
            strategy,
            succeeded: false,
            character_count: 0,
            failure_reason: Some(reason),
            truncated: false,
        }
    }

    #[test]
    fn test_composite_lists_attempts_and_solutions() {
        let attempts = [
            failed(StrategyName::RawPattern, FailureReason::MinimalTextFound),
            failed(StrategyName::StructuredPdf, FailureReason::InsufficientText),
        ];
        let text = remediation_for(
            Some(DocumentFormat::Pdf),
            FailureReason::MinimalTextFound,
            &attempts,
        );
        assert!(text.contains("Simple text extraction: found minimal text"));
        assert!(text.contains("Advanced PDF extraction: not enough readable text"));
        assert!(text.contains("paste"));
        assert!(text.contains("Word"));
        assert!(text.contains(".docx"));
    }

    #[test]
    fn test_composite_lead_follows_reason() {
        let text = remediation_for(Some(DocumentFormat::Pdf), FailureReason::TimedOut, &[]);
        assert!(text.starts_with("This PDF is too complex"));

        let text = remediation_for(Some(DocumentFormat::Pdf), FailureReason::InvalidDocument, &[]);
        assert!(text.starts_with("This PDF appears to be damaged"));
    }

    #[test]
    fn test_password_message_has_no_conversion_steps() {
        let text = remediation_for(
            Some(DocumentFormat::Pdf),
            FailureReason::PasswordProtected,
            &[failed(StrategyName::RawPattern, FailureReason::PasswordProtected)],
        );
        assert!(text.contains("password protected"));
        assert!(!text.contains("What we tried"));
    }

    #[test]
    fn test_word_document_message() {
        let text = remediation_for(Some(DocumentFormat::Docx), FailureReason::CorruptDocument, &[]);
        assert!(text.starts_with("Failed to extract text from Word document."));
        assert!(text.contains("damaged"));
    }

    #[test]
    fn test_unsupported_message() {
        let text = remediation_for(None, FailureReason::UnsupportedFormat, &[]);
        assert_eq!(text, UNSUPPORTED);
    }

    #[test]
    fn test_plain_text_message() {
        let text = remediation_for(
            Some(DocumentFormat::PlainText),
            FailureReason::InsufficientText,
            &[],
        );
        assert!(text.contains("too short"));
    }
}
