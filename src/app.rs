//! Application state and service initialization
//!
//! Builds the model client and the session registry from configuration so
//! handlers only depend on `web::Data` values.

use std::sync::Arc;

use crate::model::{Config, LimitsConfig};
use crate::service::docx::DocxExtractor;
use crate::service::{ContentNormalizer, GeminiClient, ModelClient, SessionRegistry};

/// Model identity reported by the readiness probe
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
}

/// Shared state injected into Actix-web handlers
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub limits: LimitsConfig,
    pub model: ModelInfo,
}

impl AppState {
    /// Initialize the model client and session registry
    ///
    /// Requires `GEMINI_API_KEY` in the environment.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::MissingConfig("GEMINI_API_KEY"))?;
        if api_key.trim().is_empty() {
            return Err(AppError::MissingConfig("GEMINI_API_KEY"));
        }

        let model = ModelInfo {
            name: config.model.name.clone(),
        };

        let llm_client: Arc<dyn ModelClient> = Arc::new(
            GeminiClient::new(api_key.trim(), config.model)
                .map_err(|_| AppError::InvalidConfig("Failed to build the model HTTP client"))?,
        );

        let normalizer = ContentNormalizer::new(Arc::new(DocxExtractor::new(
            config.limits.max_extracted_bytes,
        )));

        let registry = SessionRegistry::new(llm_client, normalizer, &config.sessions)
            .map_err(|e| {
                tracing::error!(error = %e, "Rejected session configuration");
                AppError::InvalidConfig(
                    "sessions.idle_timeout_minutes must be a positive number of minutes",
                )
            })?;
        let registry = Arc::new(registry);

        tracing::info!(
            model = %model.name,
            max_sessions = config.sessions.max_sessions,
            idle_timeout_minutes = config.sessions.idle_timeout_minutes,
            "Application state initialized"
        );

        Ok(Self {
            registry,
            limits: config.limits,
            model,
        })
    }

    /// Largest JSON body accepted, allowing for base64 expansion of uploads
    pub fn json_limit(&self) -> usize {
        json_limit_for(self.limits.max_upload_bytes)
    }
}

fn json_limit_for(max_upload_bytes: usize) -> usize {
    (max_upload_bytes / 3)
        .saturating_mul(4)
        .saturating_add(64 * 1024)
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
