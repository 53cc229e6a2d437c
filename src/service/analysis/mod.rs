//! Contract analysis service using the model service
//!
//! Produces a summary, an overall evaluation and scored pro/con lists with
//! verbatim quotes, primed by the classified contract type and language.

use std::sync::Arc;
use std::time::Instant;

use crate::model::extracted::ExtractedAnalysis;
use crate::model::{AnalysisResult, CanonicalContent};
use crate::service::analysis::converters::convert_analysis;
use crate::service::analysis::prompts::build_analysis_instruction;
use crate::service::analysis::validation::validate_analysis;
use crate::service::error::AnalysisError;
use crate::service::llm::ModelClient;

pub mod converters;
pub mod prompts;
pub mod validation;

/// Analyzes a contract; no retries on failure
#[derive(Clone)]
pub struct ContractAnalyzer {
    llm_client: Arc<dyn ModelClient>,
}

impl ContractAnalyzer {
    pub fn new(llm_client: Arc<dyn ModelClient>) -> Self {
        Self { llm_client }
    }

    /// Analyze `content` as a `contract_type` written in `language`
    ///
    /// The result is returned only once every required field has been
    /// validated; a partial analysis is never produced.
    pub async fn analyze(
        &self,
        content: &CanonicalContent,
        contract_type: &str,
        language: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start_time = Instant::now();
        let instruction = build_analysis_instruction(contract_type, language);

        tracing::debug!(
            contract_type = %contract_type,
            language = %language,
            content_kind = content.kind(),
            "Requesting contract analysis"
        );

        let reply = match self.llm_client.analyze(content, &instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    contract_type = %contract_type,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "Analysis call failed"
                );
                return Err(e.into());
            }
        };

        let analysis = parse_analysis(reply.as_deref())?;

        let validation = validate_analysis(&analysis, content.as_text());
        for warning in &validation.warnings {
            tracing::warn!(contract_type = %contract_type, warning = %warning, "Analysis quality warning");
        }

        tracing::info!(
            contract_type = %contract_type,
            pros = analysis.pros.len(),
            cons = analysis.cons.len(),
            warnings = validation.warnings.len(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "Contract analysis completed"
        );

        Ok(analysis)
    }
}

/// Translate the raw model reply into an [`AnalysisResult`]
pub fn parse_analysis(reply: Option<&str>) -> Result<AnalysisResult, AnalysisError> {
    let json = reply
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AnalysisError::EmptyModelResponse)?;

    let extracted: ExtractedAnalysis = serde_json::from_str(json)?;
    Ok(convert_analysis(extracted))
}
