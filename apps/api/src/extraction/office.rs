//! Word document extraction for `.docx` (OOXML zip) and legacy `.doc` (OLE2) files.
//!
//! The container is recognised from its leading bytes, not the declared MIME type, so
//! a `.docx` uploaded with the legacy type still reads correctly.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use bytes::Bytes;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::attempt::{ExtractionAttemptResult, Extractor, FailureReason, StrategyName};
use crate::extraction::{meets_threshold, MIN_VIABLE_TEXT_CHARS};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const DOCUMENT_PART: &str = "word/document.xml";
/// Maximum decompressed bytes read from the document part (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Shortest character run the legacy scanner keeps.
const MIN_RUN_CHARS: usize = 4;

#[derive(Debug, Error)]
enum OfficeError {
    #[error("not a Word document container")]
    UnknownContainer,

    #[error("zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("word/document.xml not found")]
    MissingBody,

    #[error("word/document.xml exceeds size limit")]
    TooLarge,

    #[error("reading archive entry: {0}")]
    Io(#[from] std::io::Error),

    #[error("document xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document is encrypted")]
    Encrypted,
}

impl OfficeError {
    fn reason(&self) -> FailureReason {
        match self {
            OfficeError::Encrypted => FailureReason::PasswordProtected,
            OfficeError::Archive(e) if e.to_string().to_lowercase().contains("password") => {
                FailureReason::PasswordProtected
            }
            _ => FailureReason::CorruptDocument,
        }
    }
}

pub struct OfficeExtractor {
    threshold: usize,
}

impl OfficeExtractor {
    pub fn new() -> Self {
        Self {
            threshold: MIN_VIABLE_TEXT_CHARS,
        }
    }
}

impl Default for OfficeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for OfficeExtractor {
    fn strategy(&self) -> StrategyName {
        StrategyName::OfficeDocument
    }

    async fn extract(&self, bytes: Bytes) -> ExtractionAttemptResult {
        let threshold = self.threshold;
        match tokio::task::spawn_blocking(move || extract_office(&bytes, threshold)).await {
            Ok(attempt) => attempt,
            Err(e) => {
                warn!("office extraction task failed: {e}");
                ExtractionAttemptResult::failure(
                    StrategyName::OfficeDocument,
                    FailureReason::RuntimeInitError,
                    format!("office extraction task failed: {e}"),
                )
            }
        }
    }
}

pub fn extract_office(bytes: &[u8], threshold: usize) -> ExtractionAttemptResult {
    let text = if bytes.starts_with(ZIP_MAGIC) {
        docx_text(bytes)
    } else if bytes.starts_with(OLE2_MAGIC) {
        legacy_doc_text(bytes, threshold)
    } else {
        Err(OfficeError::UnknownContainer)
    };

    match text {
        Ok(text) => {
            debug!(characters = text.chars().count(), "office extraction finished");
            ExtractionAttemptResult::evaluate(
                StrategyName::OfficeDocument,
                text,
                threshold,
                FailureReason::InsufficientText,
            )
        }
        Err(e) => ExtractionAttemptResult::failure(StrategyName::OfficeDocument, e.reason(), e.to_string()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

fn docx_text(bytes: &[u8]) -> Result<String, OfficeError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let entry = match archive.by_name(DOCUMENT_PART) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Err(OfficeError::MissingBody),
        Err(e) => return Err(e.into()),
    };

    let mut xml = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut xml)?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(OfficeError::TooLarge);
    }
    document_xml_text(&xml)
}

/// Collects `w:t` runs. Tabs become spaces; breaks and paragraph ends become newlines.
fn document_xml_text(xml: &[u8]) -> Result<String, OfficeError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push(' '),
                b"br" | b"cr" | b"p" => out.push('\n'),
                _ => {}
            },
            Event::Text(te) if in_text => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

// ────────────────────────────────────────────────────────────────────────────
// Legacy .doc
// ────────────────────────────────────────────────────────────────────────────

/// Scans an OLE2 compound file for readable runs. Word 97+ stores body text either
/// as UTF-16LE or as 8-bit code-page text; the UTF-16 reading wins when it is viable.
fn legacy_doc_text(bytes: &[u8], threshold: usize) -> Result<String, OfficeError> {
    let marker: Vec<u8> = "EncryptedPackage"
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();
    if bytes.windows(marker.len()).any(|window| window == marker.as_slice()) {
        return Err(OfficeError::Encrypted);
    }

    let wide = utf16_runs(bytes);
    if meets_threshold(&wide, threshold) {
        return Ok(wide);
    }
    let narrow = byte_runs(bytes);
    if narrow.chars().count() > wide.chars().count() {
        Ok(narrow)
    } else {
        Ok(wide)
    }
}

fn utf16_runs(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .map(|unit| char::from_u32(u32::from(unit)).filter(|c| is_text_char(*c)));
    collect_runs(units)
}

fn byte_runs(bytes: &[u8]) -> String {
    let chars = bytes.iter().map(|&b| {
        let c = b as char;
        (c.is_ascii_graphic() || c == ' ' || c == '\t' || c == '\r' || c == '\n').then_some(c)
    });
    collect_runs(chars)
}

fn is_text_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
        || c.is_ascii_graphic()
        || ('\u{00A0}'..='\u{024F}').contains(&c)
        || matches!(c, '\u{2018}'..='\u{201D}' | '\u{2022}' | '\u{2013}' | '\u{2014}')
}

/// Joins runs of at least `MIN_RUN_CHARS` text characters that contain a letter.
fn collect_runs(chars: impl Iterator<Item = Option<char>>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run = String::new();

    let mut flush = |run: &mut String| {
        if run.chars().count() >= MIN_RUN_CHARS && run.chars().any(char::is_alphabetic) {
            lines.extend(
                run.split(['\r', '\n'])
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
        run.clear();
    };

    for c in chars {
        match c {
            Some(c) => run.push(c),
            None => flush(&mut run),
        }
    }
    flush(&mut run);

    lines.join("\n")
}
