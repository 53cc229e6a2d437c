//! Document-bound conversational session
//!
//! Answers questions strictly from the analyzed document. When the model
//! replies with the web-search sentinel the session records a pending
//! escalation and shows a permission prompt instead of the sentinel.
//!
//! Each network-bound operation is split into a `begin_*` step that mutates
//! the transcript and builds the outgoing request, and a `complete_*` step
//! that applies the reply. Callers that own the session for the whole call
//! can use [`ChatSession::ask`] and [`ChatSession::resolve_permission`].

use crate::model::{
    AskOutcome, CanonicalContent, ChatTurn, Classification, ContentPart, PendingEscalation,
};
use crate::service::chat::prompts::{
    CHAT_ERROR_MESSAGE, DOCUMENT_SEED_PREFIX, PERMISSION_PROMPT_MESSAGE, WEB_SEARCH_SENTINEL,
    WELCOME_MESSAGE, build_chat_instruction,
};
use crate::service::llm::{ChatRequest, ModelClient, ModelError, ModelMessage, ModelRole};

pub mod error;
pub mod escalation;
pub mod prompts;

pub use error::ChatError;
pub use escalation::PermissionStep;

/// Dialogue state bound to one analyzed document
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_instruction: String,
    language: String,
    /// Model-side history, starting with the document seed
    history: Vec<ModelMessage>,
    transcript: Vec<ChatTurn>,
    pending: Option<PendingEscalation>,
}

impl ChatSession {
    /// Start a session seeded with the document and one welcome turn
    pub fn new(content: &CanonicalContent, classification: &Classification) -> Self {
        let mut seed_parts = vec![ContentPart::Text(DOCUMENT_SEED_PREFIX.to_string())];
        seed_parts.extend(content.parts());

        Self {
            system_instruction: build_chat_instruction(
                &classification.contract_type,
                &classification.language,
            ),
            language: classification.language.clone(),
            history: vec![ModelMessage {
                role: ModelRole::User,
                parts: seed_parts,
            }],
            transcript: vec![ChatTurn::assistant(WELCOME_MESSAGE)],
            pending: None,
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn pending_escalation(&self) -> Option<&PendingEscalation> {
        self.pending.as_ref()
    }

    /// Ask a question and wait for the answer
    pub async fn ask(&mut self, client: &dyn ModelClient, query: &str) -> Result<AskOutcome, ChatError> {
        let request = self.begin_ask(query)?;
        let reply = client.chat_send(&request).await;
        Ok(self.complete_ask(&request.message, reply))
    }

    /// Record the user's question and build the outgoing request
    ///
    /// Rejected while a permission prompt is awaiting an answer.
    pub fn begin_ask(&mut self, query: &str) -> Result<ChatRequest, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        if self.pending.is_some() {
            return Err(ChatError::PermissionPending);
        }

        self.transcript.push(ChatTurn::user(query));

        Ok(ChatRequest {
            system_instruction: self.system_instruction.clone(),
            history: self.history.clone(),
            message: query.to_string(),
        })
    }

    /// Apply the model reply to a question started with [`Self::begin_ask`]
    ///
    /// Failures become an apology turn; they never leave a pending escalation.
    pub fn complete_ask(
        &mut self,
        query: &str,
        reply: Result<Option<String>, ModelError>,
    ) -> AskOutcome {
        let text = match reply {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Chat reply contained no text");
                return self.fail_turn();
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat request failed");
                return self.fail_turn();
            }
        };

        self.history.push(ModelMessage::user_text(query));
        self.history.push(ModelMessage::model_text(text.as_str()));

        if is_web_search_sentinel(&text) {
            tracing::info!("Document has no answer, asking permission for web search");
            self.pending = Some(PendingEscalation {
                original_query: query.to_string(),
            });
            self.transcript
                .push(ChatTurn::permission_prompt(PERMISSION_PROMPT_MESSAGE));
            return AskOutcome::NeedsPermission {
                original_query: query.to_string(),
            };
        }

        self.transcript.push(ChatTurn::assistant(text.as_str()));
        AskOutcome::Answered { text }
    }

    /// Close a question whose reply will never arrive
    pub fn abandon_ask(&mut self) {
        self.fail_turn();
    }

    fn fail_turn(&mut self) -> AskOutcome {
        self.transcript.push(ChatTurn::assistant(CHAT_ERROR_MESSAGE));
        AskOutcome::Failed {
            message: CHAT_ERROR_MESSAGE.to_string(),
        }
    }
}

/// True when the model asked for a web search instead of answering
pub fn is_web_search_sentinel(reply: &str) -> bool {
    reply.trim() == WEB_SEARCH_SENTINEL
}
