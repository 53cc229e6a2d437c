//! Permissioned web-search fallback
//!
//! Resolves a pending escalation: the permission prompt is removed from the
//! transcript, and on approval a web-grounded query is issued with the tail
//! of the conversation as context.

use std::collections::HashSet;

use crate::model::{ChatTurn, GroundingSource};
use crate::service::chat::prompts::{
    DECLINED_MESSAGE, SEARCH_ERROR_MESSAGE, SEARCH_NO_ANSWER_MESSAGE, build_search_prompt,
};
use crate::service::chat::{ChatError, ChatSession};
use crate::service::llm::{GroundedReply, GroundingChunk, ModelClient, ModelError};

/// What to do after the user answered a permission prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionStep {
    /// Search refused; the acknowledgment turn was appended
    Declined(ChatTurn),
    /// Search allowed; issue a grounded query with this prompt
    Search { prompt: String },
}

impl ChatSession {
    /// Answer the pending permission prompt and run the search if allowed
    pub async fn resolve_permission(
        &mut self,
        client: &dyn ModelClient,
        granted: bool,
    ) -> Result<ChatTurn, ChatError> {
        match self.begin_permission(granted)? {
            PermissionStep::Declined(turn) => Ok(turn),
            PermissionStep::Search { prompt } => {
                let reply = client.grounded_query(&prompt).await;
                Ok(self.complete_escalation(reply))
            }
        }
    }

    /// Consume the pending escalation and remove its prompt
    ///
    /// The pending escalation is cleared before any search is issued, so a
    /// second answer is rejected with `NoPendingEscalation`.
    pub fn begin_permission(&mut self, granted: bool) -> Result<PermissionStep, ChatError> {
        let pending = self.pending.take().ok_or(ChatError::NoPendingEscalation)?;
        self.remove_permission_prompt();

        if !granted {
            tracing::info!("Web search declined by user");
            let turn = ChatTurn::assistant(DECLINED_MESSAGE);
            self.transcript.push(turn.clone());
            return Ok(PermissionStep::Declined(turn));
        }

        tracing::info!("Web search approved by user");
        let prompt = build_search_prompt(&self.transcript, &pending.original_query, &self.language);
        Ok(PermissionStep::Search { prompt })
    }

    /// Apply the grounded query result; failures become an apology turn
    pub fn complete_escalation(
        &mut self,
        reply: Result<GroundedReply, ModelError>,
    ) -> ChatTurn {
        let turn = match reply {
            Ok(reply) => {
                let sources = collect_sources(reply.chunks);
                let text = reply
                    .text
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| SEARCH_NO_ANSWER_MESSAGE.to_string());

                tracing::info!(sources = sources.len(), "Web search answered");
                ChatTurn::with_sources(text, sources)
            }
            Err(e) => {
                tracing::error!(error = %e, "Web search failed");
                ChatTurn::assistant(SEARCH_ERROR_MESSAGE)
            }
        };

        self.transcript.push(turn.clone());
        turn
    }

    /// Close a search whose reply will never arrive
    pub fn abandon_escalation(&mut self) {
        self.transcript.push(ChatTurn::assistant(SEARCH_ERROR_MESSAGE));
    }

    fn remove_permission_prompt(&mut self) {
        if let Some(index) = self.transcript.iter().rposition(|t| t.is_permission_prompt) {
            self.transcript.remove(index);
        }
    }
}

/// Keep citations carrying both a URI and a title, first occurrence per URI
pub fn collect_sources(chunks: Vec<GroundingChunk>) -> Vec<GroundingSource> {
    let mut seen = HashSet::new();

    chunks
        .into_iter()
        .filter_map(|chunk| match (chunk.uri, chunk.title) {
            (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                Some(GroundingSource { uri, title })
            }
            _ => None,
        })
        .filter(|source| seen.insert(source.uri.clone()))
        .collect()
}
