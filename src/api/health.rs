//! Health check endpoints for Kubernetes liveness and readiness probes

use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::ModelInfo;
use crate::service::SessionRegistry;

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessStatus {
    pub status: String,
    pub version: String,
    pub model: String,
    pub sessions: SessionCapacity,
}

#[derive(Serialize, ToSchema)]
pub struct SessionCapacity {
    pub active: usize,
    pub max: usize,
}

/// Liveness probe endpoint
///
/// Always returns 200 OK if the service is running.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = HealthStatus)
    ),
    tag = "health"
)]
#[get("/health/live")]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe endpoint
///
/// Returns 503 while the session registry is at capacity, since no new
/// session could be created.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessStatus),
        (status = 503, description = "Service is not ready", body = ReadinessStatus)
    ),
    tag = "health"
)]
#[get("/health/ready")]
pub async fn readiness(
    registry: web::Data<SessionRegistry>,
    model: web::Data<ModelInfo>,
) -> impl Responder {
    let active = registry.len();
    let max = registry.capacity();
    let ready = active < max;

    if !ready {
        tracing::warn!(active = active, max = max, "Readiness check failed: session limit reached");
    }

    let status = ReadinessStatus {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: model.name.clone(),
        sessions: SessionCapacity { active, max },
    };

    if ready {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(liveness).service(readiness);
}
