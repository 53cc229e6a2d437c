//! REST API endpoints for analysis sessions

use actix_web::{HttpResponse, delete, get, post, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::{ApiError, ErrorResponse};
use crate::model::{
    AskOutcome, ChatTurn, DocumentInput, LimitsConfig, PointSide, UploadedFile,
};
use crate::service::{PipelineSnapshot, SessionHandle, SessionRegistry};

/// Session identity plus its current pipeline state
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: String,
    #[serde(flatten)]
    pub snapshot: PipelineSnapshot,
}

impl SessionResponse {
    fn new(handle: &SessionHandle, snapshot: PipelineSnapshot) -> Self {
        Self {
            session_id: handle.id,
            created_at: handle.created_at.to_rfc3339(),
            snapshot,
        }
    }
}

/// Document to analyze; a file takes precedence over text
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    pub text: Option<String>,
    pub file: Option<FileUpload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FileUpload {
    /// Original file name; its extension selects the handling
    pub name: String,
    pub content_base64: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatMessageRequest {
    pub message: String,
}

/// A point of the analysis, indexed in display order
#[derive(Debug, Deserialize, ToSchema)]
pub struct PointQuestionRequest {
    pub side: PointSide,
    pub index: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionRequest {
    pub granted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub result: AskOutcome,
    pub transcript: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionResponse {
    /// Turn appended after the permission answer
    pub turn: ChatTurn,
    pub transcript: Vec<ChatTurn>,
}

/// Create a new analysis session
#[utoipa::path(
    post,
    path = "/v1/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 503, description = "Session limit reached", body = ErrorResponse)
    ),
    tag = "sessions"
)]
#[post("/v1/sessions")]
pub async fn create_session(
    registry: web::Data<SessionRegistry>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.create()?;
    let snapshot = handle.controller.snapshot();

    Ok(HttpResponse::Created().json(SessionResponse::new(&handle, snapshot)))
}

/// Get the current state of a session
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "sessions"
)]
#[get("/v1/sessions/{id}")]
pub async fn get_session(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.get(path.into_inner())?;
    let snapshot = handle.controller.snapshot();

    Ok(HttpResponse::Ok().json(SessionResponse::new(&handle, snapshot)))
}

/// Delete a session and all its state
#[utoipa::path(
    delete,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "sessions"
)]
#[delete("/v1/sessions/{id}")]
pub async fn delete_session(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    registry.remove(path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Submit a document and run classification and analysis
///
/// Returns once the cycle has finished; a document that is not a contract or
/// a failed model call leaves the session in `failed` with the reason.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/analysis",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis cycle finished", body = SessionResponse),
        (status = 400, description = "Missing or invalid input", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session is not idle", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 415, description = "Unsupported file type", body = ErrorResponse)
    ),
    tag = "sessions"
)]
#[post("/v1/sessions/{id}/analysis")]
pub async fn submit_analysis(
    registry: web::Data<SessionRegistry>,
    limits: web::Data<LimitsConfig>,
    path: web::Path<Uuid>,
    body: web::Json<AnalysisRequest>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.get(path.into_inner())?;
    let input = decode_input(body.into_inner(), limits.max_upload_bytes)?;

    let snapshot = handle.controller.submit_analysis(input).await?;

    Ok(HttpResponse::Ok().json(SessionResponse::new(&handle, snapshot)))
}

/// Ask a question about the analyzed document
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/chat",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "Chat turn completed", body = ChatResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Chat unavailable in the current state", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[post("/v1/sessions/{id}/chat")]
pub async fn send_chat_message(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<ChatMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.get(path.into_inner())?;

    let result = handle.controller.send_chat_message(&body.message).await?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        result,
        transcript: handle.controller.snapshot().transcript,
    }))
}

/// Ask for more detail about one pro or con
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/chat/point",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = PointQuestionRequest,
    responses(
        (status = 200, description = "Chat turn completed", body = ChatResponse),
        (status = 404, description = "Session or point not found", body = ErrorResponse),
        (status = 409, description = "Chat unavailable in the current state", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[post("/v1/sessions/{id}/chat/point")]
pub async fn ask_about_point(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<PointQuestionRequest>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.get(path.into_inner())?;

    let result = handle
        .controller
        .ask_about_point(body.side, body.index)
        .await?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        result,
        transcript: handle.controller.snapshot().transcript,
    }))
}

/// Answer the pending web-search permission prompt
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/permission",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = PermissionRequest,
    responses(
        (status = 200, description = "Permission answer applied", body = PermissionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "No permission request is pending", body = ErrorResponse)
    ),
    tag = "chat"
)]
#[post("/v1/sessions/{id}/permission")]
pub async fn respond_to_permission(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<PermissionRequest>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.get(path.into_inner())?;

    let turn = handle.controller.respond_to_permission(body.granted).await?;

    Ok(HttpResponse::Ok().json(PermissionResponse {
        turn,
        transcript: handle.controller.snapshot().transcript,
    }))
}

/// Discard the document, analysis and chat and return to idle
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/reset",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session reset", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "sessions"
)]
#[post("/v1/sessions/{id}/reset")]
pub async fn reset_session(
    registry: web::Data<SessionRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let handle = registry.get(path.into_inner())?;
    let snapshot = handle.controller.reset();

    Ok(HttpResponse::Ok().json(SessionResponse::new(&handle, snapshot)))
}

fn decode_input(request: AnalysisRequest, max_upload_bytes: usize) -> Result<DocumentInput, ApiError> {
    let file = match request.file {
        Some(upload) => {
            let bytes = STANDARD
                .decode(upload.content_base64.trim())
                .map_err(|e| ApiError::BadRequest(format!("file content is not valid base64: {}", e)))?;
            if bytes.len() > max_upload_bytes {
                return Err(ApiError::PayloadTooLarge {
                    size: bytes.len(),
                    limit: max_upload_bytes,
                });
            }
            Some(UploadedFile {
                name: upload.name,
                bytes,
                mime_type: upload.mime_type,
            })
        }
        None => None,
    };

    DocumentInput::from_parts(request.text, file)
        .ok_or_else(|| ApiError::BadRequest("provide either text or a file".to_string()))
}

/// Configure session and chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_session)
        .service(get_session)
        .service(delete_session)
        .service(submit_analysis)
        .service(send_chat_message)
        .service(ask_about_point)
        .service(respond_to_permission)
        .service(reset_session);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test as actix_test};
    use serde_json::{Value, json};

    use super::*;
    use crate::model::SessionConfig;
    use crate::service::ContentNormalizer;
    use crate::service::chat::prompts::WEB_SEARCH_SENTINEL;
    use crate::service::llm::GroundedReply;
    use crate::service::testing::StubModelClient;

    const CONTRACT_JSON: &str =
        r#"{"isContract": true, "contractType": "Service Agreement", "language": "English"}"#;
    const ANALYSIS_JSON: &str = r#"{
        "summary": "Consulting services for six months.",
        "evaluation": "Favorable to the provider.",
        "pros": [{"description": "Clear scope", "source": "Services are listed in Annex A.", "score": "Medium"}],
        "cons": [{"description": "Unlimited liability", "source": "The client bears all liability.", "score": "High"}]
    }"#;

    fn app_data(
        stub: &Arc<StubModelClient>,
    ) -> (web::Data<SessionRegistry>, web::Data<LimitsConfig>) {
        let registry = SessionRegistry::new(
            Arc::clone(stub) as Arc<dyn crate::service::ModelClient>,
            ContentNormalizer::default(),
            &SessionConfig::default(),
        )
        .unwrap();
        (
            web::Data::new(registry),
            web::Data::new(LimitsConfig {
                max_upload_bytes: 16,
                ..LimitsConfig::default()
            }),
        )
    }

    macro_rules! init_app {
        ($stub:expr) => {{
            let (registry, limits) = app_data($stub);
            actix_test::init_service(
                App::new()
                    .app_data(registry)
                    .app_data(limits)
                    .configure(configure),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_full_session_flow() {
        let stub = Arc::new(StubModelClient::new());
        stub.push_classify(Ok(Some(CONTRACT_JSON.to_string())))
            .push_analyze(Ok(Some(ANALYSIS_JSON.to_string())))
            .push_chat(Ok(Some(WEB_SEARCH_SENTINEL.to_string())))
            .push_grounded(Ok(GroundedReply {
                text: Some("Liability caps are common.".to_string()),
                chunks: vec![],
            }));
        let app = init_app!(&stub);

        let req = actix_test::TestRequest::post().uri("/v1/sessions").to_request();
        let created: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["status"], "idle");
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/analysis"))
            .set_json(json!({"text": "The client bears all liability."}))
            .to_request();
        let analyzed: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(analyzed["status"], "ready");
        assert_eq!(analyzed["classification"]["contract_type"], "Service Agreement");
        assert_eq!(analyzed["transcript"].as_array().unwrap().len(), 1);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/chat"))
            .set_json(json!({"message": "Is this liability clause usual?"}))
            .to_request();
        let chat: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(chat["result"]["outcome"], "needs_permission");

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/permission"))
            .set_json(json!({"granted": true}))
            .to_request();
        let permission: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(permission["turn"]["text"], "Liability caps are common.");

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/reset"))
            .to_request();
        let reset: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(reset["status"], "idle");
        assert_eq!(reset["transcript"], json!([]));
    }

    #[actix_web::test]
    async fn test_unknown_session_is_not_found() {
        let stub = Arc::new(StubModelClient::new());
        let app = init_app!(&stub);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/v1/sessions/{}", Uuid::new_v4()))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "not_found");
    }

    #[actix_web::test]
    async fn test_unsupported_file_type() {
        let stub = Arc::new(StubModelClient::new());
        let app = init_app!(&stub);
        let req = actix_test::TestRequest::post().uri("/v1/sessions").to_request();
        let created: Value = actix_test::call_and_read_body_json(&app, req).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/analysis"))
            .set_json(json!({"file": {"name": "notes.txt", "content_base64": "aGVsbG8="}}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let req = actix_test::TestRequest::get()
            .uri(&format!("/v1/sessions/{id}"))
            .to_request();
        let session: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(session["status"], "idle");
    }

    #[actix_web::test]
    async fn test_oversized_upload() {
        let stub = Arc::new(StubModelClient::new());
        let app = init_app!(&stub);
        let req = actix_test::TestRequest::post().uri("/v1/sessions").to_request();
        let created: Value = actix_test::call_and_read_body_json(&app, req).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/analysis"))
            .set_json(json!({"file": {"name": "scan.png", "content_base64": STANDARD.encode([0u8; 32])}}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_chat_before_analysis_conflicts() {
        let stub = Arc::new(StubModelClient::new());
        let app = init_app!(&stub);
        let req = actix_test::TestRequest::post().uri("/v1/sessions").to_request();
        let created: Value = actix_test::call_and_read_body_json(&app, req).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/v1/sessions/{id}/chat"))
            .set_json(json!({"message": "hello"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "not_ready");
    }

    #[test]
    fn test_decode_input_requires_content() {
        let result = decode_input(
            AnalysisRequest {
                text: Some("   ".to_string()),
                file: None,
            },
            1024,
        );
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_decode_input_rejects_bad_base64() {
        let result = decode_input(
            AnalysisRequest {
                text: None,
                file: Some(FileUpload {
                    name: "a.pdf".to_string(),
                    content_base64: "not base64!".to_string(),
                    mime_type: None,
                }),
            },
            1024,
        );
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
