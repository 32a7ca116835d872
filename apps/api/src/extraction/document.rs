//! The uploaded document value and the reader that produces it.

use bytes::Bytes;

const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded file, created once and never mutated. `Bytes` clones are cheap
/// reference-count bumps, so strategies can each take an owned handle.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    bytes: Bytes,
    declared_mime_type: String,
    size_bytes: usize,
    file_name: String,
}

impl UploadedDocument {
    pub fn new(
        file_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            size_bytes: bytes.len(),
            bytes,
            declared_mime_type: declared_mime_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn declared_mime_type(&self) -> &str {
        &self.declared_mime_type
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Reads uploads into memory and settles their declared MIME type.
pub struct ByteReader;

impl ByteReader {
    /// Builds a document from a multipart upload. Content-type parameters are dropped
    /// (`text/plain; charset=utf-8` becomes `text/plain`); a missing or generic
    /// content type is guessed from the file extension.
    pub fn from_upload(
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> UploadedDocument {
        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("unknown-file");
        let mime = resolve_mime(content_type, file_name);
        UploadedDocument::new(file_name, mime, bytes)
    }
}

fn resolve_mime(content_type: Option<&str>, file_name: &str) -> String {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != OCTET_STREAM);

    declared.unwrap_or_else(|| {
        mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::classifier::{MIME_DOC, MIME_DOCX, MIME_PDF, MIME_TEXT};

    #[test]
    fn test_document_records_size() {
        let doc = UploadedDocument::new("cv.txt", MIME_TEXT, b"hello world".to_vec());
        assert_eq!(doc.size_bytes(), 11);
        assert_eq!(doc.file_name(), "cv.txt");
        assert_eq!(doc.declared_mime_type(), MIME_TEXT);
    }

    #[test]
    fn test_content_type_parameters_dropped() {
        let doc = ByteReader::from_upload(
            Some("cv.txt"),
            Some("Text/Plain; charset=utf-8"),
            b"hi".to_vec(),
        );
        assert_eq!(doc.declared_mime_type(), MIME_TEXT);
    }

    #[test]
    fn test_missing_content_type_guessed_from_extension() {
        let cases = [
            ("resume.pdf", MIME_PDF),
            ("resume.docx", MIME_DOCX),
            ("resume.doc", MIME_DOC),
            ("resume.txt", MIME_TEXT),
        ];
        for (name, expected) in cases {
            let doc = ByteReader::from_upload(Some(name), None, Vec::new());
            assert_eq!(doc.declared_mime_type(), expected, "for {name}");
        }
    }

    #[test]
    fn test_octet_stream_falls_back_to_extension() {
        let doc = ByteReader::from_upload(Some("resume.pdf"), Some(OCTET_STREAM), Vec::new());
        assert_eq!(doc.declared_mime_type(), MIME_PDF);
    }

    #[test]
    fn test_declared_type_wins_over_extension() {
        let doc = ByteReader::from_upload(Some("resume.pdf"), Some("image/png"), Vec::new());
        assert_eq!(doc.declared_mime_type(), "image/png");
    }

    #[test]
    fn test_blank_file_name_defaults() {
        let doc = ByteReader::from_upload(Some("  "), Some(MIME_TEXT), Vec::new());
        assert_eq!(doc.file_name(), "unknown-file");
    }
}
