//! Plain-text uploads: decode and trim, nothing else.

use async_trait::async_trait;
use bytes::Bytes;

use crate::extraction::attempt::{ExtractionAttemptResult, Extractor, FailureReason, StrategyName};
use crate::extraction::MIN_PLAIN_TEXT_CHARS;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

pub struct PlainTextExtractor {
    threshold: usize,
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self {
            threshold: MIN_PLAIN_TEXT_CHARS,
        }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for PlainTextExtractor {
    fn strategy(&self) -> StrategyName {
        StrategyName::PlainText
    }

    async fn extract(&self, bytes: Bytes) -> ExtractionAttemptResult {
        let text = decode_text(&bytes);
        ExtractionAttemptResult::evaluate(
            StrategyName::PlainText,
            text.trim().to_string(),
            self.threshold,
            FailureReason::InsufficientText,
        )
    }
}

/// Decodes UTF-8 (with or without BOM) or BOM-marked UTF-16. Bytes that are not valid
/// UTF-8 are read as Latin-1 so no upload is rejected for its encoding alone.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(bytes: &'static [u8]) -> ExtractionAttemptResult {
        PlainTextExtractor::new().extract(Bytes::from_static(bytes)).await
    }

    #[tokio::test]
    async fn test_content_is_trimmed_and_otherwise_unchanged() {
        let attempt = run(b"\n\n  Jane Doe\n  Software Engineer  \n\n").await;
        assert!(attempt.succeeded);
        assert_eq!(attempt.text, "Jane Doe\n  Software Engineer");
    }

    #[tokio::test]
    async fn test_plain_text_threshold_is_ten() {
        assert!(run(b"0123456789").await.succeeded);

        let short = run(b"   012345678   ").await;
        assert_eq!(short.failure_reason, Some(FailureReason::InsufficientText));
        assert_eq!(short.character_count, 9);
    }

    #[tokio::test]
    async fn test_whitespace_only_fails() {
        let attempt = run(b" \n\t \r\n ").await;
        assert!(!attempt.succeeded);
        assert_eq!(attempt.character_count, 0);
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFResume"), "Resume");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let mut le = vec![0xFF, 0xFE];
        le.extend("Résumé".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(decode_text(&le), "Résumé");

        let mut be = vec![0xFE, 0xFF];
        be.extend("Résumé".encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(decode_text(&be), "Résumé");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_text(b"R\xe9sum\xe9"), "Résumé");
    }
}
