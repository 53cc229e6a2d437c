//! Document classification using the model service
//!
//! Detects the document language, decides whether it is a contract and
//! names its type.

use std::sync::Arc;
use std::time::Instant;

use crate::model::extracted::ExtractedClassification;
use crate::model::{CanonicalContent, Classification};
use crate::service::classification::prompts::CLASSIFICATION_PROMPT;
use crate::service::error::AnalysisError;
use crate::service::llm::ModelClient;

pub mod prompts;

/// Classifies canonical content; no retries on failure
#[derive(Clone)]
pub struct DocumentClassifier {
    llm_client: Arc<dyn ModelClient>,
}

impl DocumentClassifier {
    pub fn new(llm_client: Arc<dyn ModelClient>) -> Self {
        Self { llm_client }
    }

    pub async fn classify(
        &self,
        content: &CanonicalContent,
    ) -> Result<Classification, AnalysisError> {
        let start_time = Instant::now();

        tracing::debug!(content_kind = content.kind(), "Requesting document classification");

        let reply = self
            .llm_client
            .classify(content, CLASSIFICATION_PROMPT)
            .await
            .map_err(|e| {
                tracing::error!(
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "Classification call failed"
                );
                AnalysisError::from(e)
            })?;

        let classification = parse_classification(reply.as_deref())?;

        tracing::info!(
            is_contract = classification.is_contract,
            contract_type = %classification.contract_type,
            language = %classification.language,
            elapsed_ms = start_time.elapsed().as_millis(),
            "Document classified"
        );

        Ok(classification)
    }
}

/// Translate the raw model reply into a [`Classification`]
pub fn parse_classification(reply: Option<&str>) -> Result<Classification, AnalysisError> {
    let json = reply
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AnalysisError::EmptyModelResponse)?;

    let extracted: ExtractedClassification = serde_json::from_str(json)?;

    Ok(Classification {
        is_contract: extracted.is_contract,
        contract_type: extracted.contract_type,
        language: extracted.language,
    })
}
