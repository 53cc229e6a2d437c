//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::{error, health, session};
use crate::model::{
    AnalysisResult, AskOutcome, ChatRole, ChatTurn, Classification, GroundingSource,
    PendingEscalation, PointSide, Score, ScoredPoint,
};
use crate::service::pipeline::{PipelineFailure, PipelineSnapshot, PipelineState};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Contract Risk Agent",
        description = "Classifies legal documents, scores contract risks and answers questions about them"
    ),
    paths(
        session::create_session,
        session::get_session,
        session::delete_session,
        session::submit_analysis,
        session::send_chat_message,
        session::ask_about_point,
        session::respond_to_permission,
        session::reset_session,
        health::liveness,
        health::readiness,
    ),
    components(schemas(
        session::SessionResponse,
        session::AnalysisRequest,
        session::FileUpload,
        session::ChatMessageRequest,
        session::PointQuestionRequest,
        session::PermissionRequest,
        session::ChatResponse,
        session::PermissionResponse,
        error::ErrorResponse,
        health::HealthStatus,
        health::ReadinessStatus,
        health::SessionCapacity,
        PipelineSnapshot,
        PipelineState,
        PipelineFailure,
        Classification,
        AnalysisResult,
        ScoredPoint,
        Score,
        PointSide,
        ChatTurn,
        ChatRole,
        GroundingSource,
        PendingEscalation,
        AskOutcome,
    )),
    tags(
        (name = "sessions", description = "Document analysis sessions"),
        (name = "chat", description = "Questions about the analyzed document"),
        (name = "health", description = "Probes"),
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
