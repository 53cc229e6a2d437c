//! Dialogue transcript types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Web citation attached to a grounded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// One visible entry of the dialogue transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    #[serde(default)]
    pub is_permission_prompt: bool,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            is_permission_prompt: false,
            sources: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
            is_permission_prompt: false,
            sources: Vec::new(),
        }
    }

    /// Assistant turn asking the user to allow a web search
    pub fn permission_prompt(text: impl Into<String>) -> Self {
        Self {
            is_permission_prompt: true,
            ..Self::assistant(text)
        }
    }

    /// Assistant turn carrying web citations
    pub fn with_sources(text: impl Into<String>, sources: Vec<GroundingSource>) -> Self {
        Self {
            sources,
            ..Self::assistant(text)
        }
    }

    /// Speaker label used when replaying the transcript into a prompt
    pub fn speaker(&self) -> &'static str {
        match self.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        }
    }
}

/// A web-search permission request awaiting the user's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PendingEscalation {
    pub original_query: String,
}

/// Result of asking a question about the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AskOutcome {
    /// Answer derived from the document
    Answered { text: String },
    /// The document cannot answer; a web search needs the user's permission
    NeedsPermission { original_query: String },
    /// The turn failed; an apology was added to the transcript
    Failed { message: String },
}
