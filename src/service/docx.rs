//! Plain-text extraction from Word (.docx) documents

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</w:p>").unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:(?:br|cr)\s*/>").unwrap());
static TAB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\s*/>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Not a valid DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to read document body: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document body exceeds {limit} bytes once decompressed")]
    TooLarge { limit: u64 },
}

/// Converts a file into plain text
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Reads the main document part of a DOCX container
///
/// Decompression stops at `max_xml_bytes`, so a small archive cannot expand
/// into an unbounded allocation.
#[derive(Debug, Clone, Copy)]
pub struct DocxExtractor {
    max_xml_bytes: u64,
}

impl DocxExtractor {
    pub fn new(max_xml_bytes: u64) -> Self {
        Self { max_xml_bytes }
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new(crate::model::LimitsConfig::default().max_extracted_bytes)
    }
}

impl TextExtractor for DocxExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)?
            .take(self.max_xml_bytes.saturating_add(1))
            .read_to_string(&mut xml)?;

        if xml.len() as u64 > self.max_xml_bytes {
            return Err(ExtractionError::TooLarge {
                limit: self.max_xml_bytes,
            });
        }

        let text = xml_to_text(&xml);
        tracing::debug!(chars = text.len(), "Extracted text from DOCX");
        Ok(text)
    }
}

/// Flatten WordprocessingML into text, one line per paragraph
fn xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    unescape_xml(text.trim())
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body>
<w:p><w:r><w:t>Article 1.</w:t></w:r><w:r><w:tab/><w:t>Term</w:t></w:r></w:p>
<w:p><w:r><w:t>Fees &amp; expenses &lt;net&gt;</w:t></w:r></w:p>
</w:body></w:document>"#;

        let text = DocxExtractor::default().extract_text(&build_docx(xml)).unwrap();

        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["Article 1.\tTerm", "Fees & expenses <net>"]);
    }

    #[test]
    fn test_not_a_zip_fails() {
        let result = DocxExtractor::default().extract_text(b"plain bytes");
        assert!(matches!(result, Err(ExtractionError::Archive(_))));
    }

    #[test]
    fn test_missing_document_part_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(DocxExtractor::default().extract_text(&bytes).is_err());
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        let xml = format!("<w:p>{}</w:p>", "a".repeat(4096));
        let bytes = build_docx(&xml);

        let result = DocxExtractor::new(1024).extract_text(&bytes);
        assert!(matches!(result, Err(ExtractionError::TooLarge { limit: 1024 })));

        assert!(DocxExtractor::new(8192).extract_text(&bytes).is_ok());
    }

    #[test]
    fn test_escaped_ampersand_is_unescaped_once() {
        assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
    }
}
