//! Error types for the pipeline controller

use thiserror::Error;

use crate::model::PointSide;
use crate::service::chat::ChatError;
use crate::service::error::AnalysisError;
use crate::service::pipeline::PipelineState;

/// Rejected pipeline operation
///
/// Analysis failures after normalization are not errors here: they move the
/// pipeline to `Failed` and are reported through the snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    Input(AnalysisError),

    #[error("Cannot {operation} while the pipeline is {state}")]
    InvalidState {
        operation: &'static str,
        state: PipelineState,
    },

    #[error("Another chat operation is still in progress")]
    Busy,

    #[error("No analyzed document is available for chat")]
    NotReady,

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("No {side:?} point at position {index}")]
    PointNotFound { side: PointSide, index: usize },

    #[error("The session was reset while the request was in flight")]
    Superseded,
}
