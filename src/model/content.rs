//! Canonical document content shared by every pipeline stage

use std::path::Path;

/// One segment of a multi-part payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Embedded binary segment, `data` is base64 encoded
    InlineBinary { mime_type: String, data: String },
}

/// Normalized, model-agnostic representation of a submitted document
///
/// A `Multipart` payload always holds at least one part; build it through
/// [`CanonicalContent::multipart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalContent {
    Text(String),
    Multipart(Vec<ContentPart>),
}

impl CanonicalContent {
    /// Build a multi-part payload, rejecting an empty part list
    pub fn multipart(parts: Vec<ContentPart>) -> Option<Self> {
        if parts.is_empty() {
            None
        } else {
            Some(Self::Multipart(parts))
        }
    }

    /// Plain text of the document, when it was submitted or extracted as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Multipart(_) => None,
        }
    }

    /// The document as a list of parts
    pub fn parts(&self) -> Vec<ContentPart> {
        match self {
            Self::Text(text) => vec![ContentPart::Text(text.clone())],
            Self::Multipart(parts) => parts.clone(),
        }
    }

    /// The document preceded by an instruction
    ///
    /// Text documents are merged into a single text part separated by a rule;
    /// multi-part documents get the instruction as their first part.
    pub fn with_leading_instruction(&self, instruction: &str) -> Vec<ContentPart> {
        match self {
            Self::Text(text) => vec![ContentPart::Text(format!(
                "{}\n\n---\n\n{}",
                instruction, text
            ))],
            Self::Multipart(parts) => {
                let mut merged = Vec::with_capacity(parts.len() + 1);
                merged.push(ContentPart::Text(instruction.to_string()));
                merged.extend(parts.iter().cloned());
                merged
            }
        }
    }

    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Multipart(_) => "multipart",
        }
    }
}

/// A file handed in by the caller
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Media type declared by the uploader, if any
    pub mime_type: Option<String>,
}

impl UploadedFile {
    /// Lowercased extension of the file name
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

/// Raw analysis input: pasted text or an uploaded file
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Text(String),
    File(UploadedFile),
}

impl DocumentInput {
    /// Pick the input from an optional text and an optional file
    ///
    /// A file takes precedence; blank text counts as absent.
    pub fn from_parts(text: Option<String>, file: Option<UploadedFile>) -> Option<Self> {
        if let Some(file) = file {
            return Some(Self::File(file));
        }
        text.filter(|t| !t.trim().is_empty()).map(Self::Text)
    }
}
