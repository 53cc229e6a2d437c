//! Error taxonomy for the analysis cycle

use thiserror::Error;

use crate::service::llm::ModelError;

/// Failure of a normalization, classification or analysis step
///
/// All variants are terminal for the current analysis cycle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("No document provided: upload a file or paste the text")]
    EmptyInput,

    #[error("Unsupported file type '{0}': upload a DOCX, PDF, PNG or JPG file")]
    UnsupportedInput(String),

    #[error("The file could not be read: {0}")]
    UnreadableInput(String),

    #[error("Received an empty response from the model")]
    EmptyModelResponse,

    #[error("Could not understand the model response: {0}")]
    MalformedResponse(String),

    #[error("The document was blocked by content safety policies: {0}")]
    ContentPolicy(String),

    #[error("The model service rejected the request: {0}")]
    RequestRejected(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AnalysisError {
    /// Stable identifier used by observers to pick a message
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::EmptyInput => "empty_input",
            AnalysisError::UnsupportedInput(_) => "unsupported_input",
            AnalysisError::UnreadableInput(_) => "unreadable_input",
            AnalysisError::EmptyModelResponse => "empty_model_response",
            AnalysisError::MalformedResponse(_) => "malformed_response",
            AnalysisError::ContentPolicy(_) => "content_policy",
            AnalysisError::RequestRejected(_) => "request_rejected",
            AnalysisError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<ModelError> for AnalysisError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Blocked(reason) => AnalysisError::ContentPolicy(reason),
            ModelError::Rejected { status, body } => {
                AnalysisError::RequestRejected(format!("HTTP {}: {}", status, body))
            }
            ModelError::Decode(msg) => AnalysisError::MalformedResponse(msg),
            other => AnalysisError::Unexpected(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::MalformedResponse(err.to_string())
    }
}
