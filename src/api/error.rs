//! Unified API error handling
//!
//! Every endpoint returns `Result<T, ApiError>`; errors are rendered as a
//! JSON body with a machine-readable `error` code.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::service::chat::ChatError;
use crate::service::{AnalysisError, PipelineError, RegistryError};

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Session or point not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Malformed or missing input (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// File type the analysis cannot read (415)
    #[error("{0}")]
    UnsupportedMedia(String),

    /// Decoded upload exceeds the configured limit (413)
    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Operation not allowed in the current session state (409)
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    /// Session limit reached (503)
    #[error("{0}")]
    Unavailable(String),
}

impl ApiError {
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::UnsupportedMedia(_) => "unsupported_input",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::Conflict { code, .. } => code,
            ApiError::Unavailable(_) => "service_unavailable",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();

        tracing::warn!(
            error_type = error_type,
            status = status.as_u16(),
            message = %self,
            "API error"
        );

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id: Uuid::new_v4().to_string(),
        })
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            RegistryError::Full(_) => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::Input(AnalysisError::UnsupportedInput(_)) => {
                ApiError::UnsupportedMedia(message)
            }
            PipelineError::Input(_) => ApiError::BadRequest(message),
            PipelineError::InvalidState { .. } => ApiError::Conflict {
                code: "invalid_state",
                message,
            },
            PipelineError::Busy => ApiError::Conflict {
                code: "busy",
                message,
            },
            PipelineError::NotReady => ApiError::Conflict {
                code: "not_ready",
                message,
            },
            PipelineError::Chat(ChatError::EmptyQuery) => ApiError::BadRequest(message),
            PipelineError::Chat(ChatError::PermissionPending) => ApiError::Conflict {
                code: "permission_pending",
                message,
            },
            PipelineError::Chat(_) => ApiError::Conflict {
                code: "no_pending_escalation",
                message,
            },
            PipelineError::PointNotFound { .. } => ApiError::NotFound(message),
            PipelineError::Superseded => ApiError::Conflict {
                code: "superseded",
                message,
            },
        }
    }
}
