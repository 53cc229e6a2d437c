//! Error types for the document chat

use thiserror::Error;

/// Rejected chat operation; the transcript is left untouched
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyQuery,

    #[error("A web search permission request is awaiting an answer")]
    PermissionPending,

    #[error("No web search permission request is pending")]
    NoPendingEscalation,
}
