//! Maps a declared MIME type onto the ordered strategies that can read it.

use thiserror::Error;

use crate::extraction::attempt::StrategyName;
use crate::extraction::document::UploadedDocument;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_TEXT: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    PlainText,
}

impl DocumentFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            MIME_PDF => Some(DocumentFormat::Pdf),
            MIME_DOCX => Some(DocumentFormat::Docx),
            MIME_DOC => Some(DocumentFormat::Doc),
            MIME_TEXT => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    /// Strategies in priority order. Heuristic PDF scanning goes first because it has
    /// no engine-initialization failure modes and is cheaper.
    pub fn strategies(&self) -> &'static [StrategyName] {
        match self {
            DocumentFormat::Pdf => &[StrategyName::RawPattern, StrategyName::StructuredPdf],
            DocumentFormat::Docx | DocumentFormat::Doc => &[StrategyName::OfficeDocument],
            DocumentFormat::PlainText => &[StrategyName::PlainText],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySet {
    pub format: DocumentFormat,
    pub strategies: Vec<StrategyName>,
}

impl StrategySet {
    pub fn has_fallback(&self) -> bool {
        self.strategies.len() > 1
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported file type '{mime}'. Please upload PDF, Word (.docx), or text (.txt) files.")]
pub struct UnsupportedFormatError {
    pub mime: String,
}

/// Selects the extraction strategies for `document`. Pure; no I/O.
pub fn classify(document: &UploadedDocument) -> Result<StrategySet, UnsupportedFormatError> {
    let mime = document.declared_mime_type();
    let format = DocumentFormat::from_mime(mime).ok_or_else(|| UnsupportedFormatError {
        mime: mime.to_string(),
    })?;
    Ok(StrategySet {
        format,
        strategies: format.strategies().to_vec(),
    })
}
