//! Model service capability shared by every pipeline stage
//!
//! Components receive an `Arc<dyn ModelClient>` at construction instead of
//! reaching for a process-wide client, so tests can substitute a stub.

use async_trait::async_trait;

use crate::model::{CanonicalContent, ContentPart};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request rejected by model service ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Model service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Response blocked by safety filters: {0}")]
    Blocked(String),

    #[error("Failed to decode model response: {0}")]
    Decode(String),
}

/// Speaker of a model-side history message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    User,
    Model,
}

/// A message in the model-side conversation history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMessage {
    pub role: ModelRole,
    pub parts: Vec<ContentPart>,
}

impl ModelMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ModelRole::User,
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: ModelRole::Model,
            parts: vec![ContentPart::Text(text.into())],
        }
    }
}

/// One chat turn sent in the context of a running conversation
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_instruction: String,
    /// Prior exchange, oldest first, starting with the document seed
    pub history: Vec<ModelMessage>,
    pub message: String,
}

/// Raw citation chunk returned with a grounded answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// Answer text plus citations from a web-grounded query
#[derive(Debug, Clone, Default)]
pub struct GroundedReply {
    pub text: Option<String>,
    pub chunks: Vec<GroundingChunk>,
}

/// Calls made to the external language-model service
///
/// Structured calls return the raw JSON text (or `None` when the service
/// produced no text); translating it into domain shapes is the caller's job.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Structured classification request; `instruction` precedes the content
    async fn classify(
        &self,
        content: &CanonicalContent,
        instruction: &str,
    ) -> Result<Option<String>, ModelError>;

    /// Structured analysis request with a system instruction
    async fn analyze(
        &self,
        content: &CanonicalContent,
        system_instruction: &str,
    ) -> Result<Option<String>, ModelError>;

    /// Open chat request carrying the running history
    async fn chat_send(&self, request: &ChatRequest) -> Result<Option<String>, ModelError>;

    /// Web-grounded query
    async fn grounded_query(&self, prompt: &str) -> Result<GroundedReply, ModelError>;
}
