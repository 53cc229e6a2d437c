//! Content normalization: raw input to canonical content

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::model::{CanonicalContent, ContentPart, DocumentInput, UploadedFile};
use crate::service::docx::{DocxExtractor, TextExtractor};
use crate::service::error::AnalysisError;

/// Extensions extracted to plain text
const TEXT_EXTENSIONS: &[&str] = &["docx"];

/// Extensions embedded as a binary part
const BINARY_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

/// Turns pasted text or an uploaded file into [`CanonicalContent`]
#[derive(Clone)]
pub struct ContentNormalizer {
    extractor: Arc<dyn TextExtractor>,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(DocxExtractor::default()))
    }
}

impl ContentNormalizer {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// Normalize an input; nothing is retained on failure
    pub fn normalize(&self, input: DocumentInput) -> Result<CanonicalContent, AnalysisError> {
        match input {
            DocumentInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(AnalysisError::EmptyInput);
                }
                Ok(CanonicalContent::Text(text))
            }
            DocumentInput::File(file) => self.normalize_file(file),
        }
    }

    fn normalize_file(&self, file: UploadedFile) -> Result<CanonicalContent, AnalysisError> {
        let extension = file.extension().unwrap_or_default();

        if TEXT_EXTENSIONS.contains(&extension.as_str()) {
            let text = self.extractor.extract_text(&file.bytes).map_err(|e| {
                tracing::warn!(file = %file.name, error = %e, "Text extraction failed");
                AnalysisError::UnreadableInput(e.to_string())
            })?;

            if text.trim().is_empty() {
                return Err(AnalysisError::EmptyInput);
            }

            tracing::debug!(file = %file.name, chars = text.len(), "Normalized file to text");
            return Ok(CanonicalContent::Text(text));
        }

        if BINARY_EXTENSIONS.contains(&extension.as_str()) {
            if file.bytes.is_empty() {
                return Err(AnalysisError::EmptyInput);
            }

            let part = to_inline_binary(&file, &extension);
            tracing::debug!(
                file = %file.name,
                bytes = file.bytes.len(),
                "Normalized file to inline binary"
            );
            return CanonicalContent::multipart(vec![part]).ok_or(AnalysisError::EmptyInput);
        }

        tracing::debug!(file = %file.name, extension = %extension, "Unsupported file type");
        Err(AnalysisError::UnsupportedInput(extension))
    }
}

/// Base64 encode a file as an inline binary part
fn to_inline_binary(file: &UploadedFile, extension: &str) -> ContentPart {
    let mime_type = file
        .mime_type
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| mime_type_for(extension).to_string());

    ContentPart::InlineBinary {
        mime_type,
        data: STANDARD.encode(&file.bytes),
    }
}

fn mime_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
