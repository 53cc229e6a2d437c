//! Gemini `generateContent` client
//!
//! Implements [`ModelClient`] over the REST API. Structured calls attach a
//! JSON schema generated from the extraction models; grounded queries enable
//! the Google Search tool and surface the returned grounding chunks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::extracted::{ExtractedAnalysis, ExtractedClassification};
use crate::model::{CanonicalContent, ContentPart, ModelConfig};
use crate::service::llm::{
    ChatRequest, GroundedReply, GroundingChunk, ModelClient, ModelError, ModelMessage, ModelRole,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";
const SAFETY_FINISH_REASON: &str = "SAFETY";

/// Model client speaking the Gemini REST protocol
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: ModelConfig,
    classification_schema: Value,
    analysis_schema: Value,
}

impl GeminiClient {
    pub fn new(api_key: &str, config: ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("contract-risk-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!(model = %config.name, "Gemini client initialized");

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            classification_schema: response_schema::<ExtractedClassification>(),
            analysis_schema: response_schema::<ExtractedAnalysis>(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.as_str().trim_end_matches('/'),
            self.config.name
        )
    }

    async fn generate(
        &self,
        call: &'static str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ModelError> {
        let start_time = Instant::now();

        tracing::debug!(
            call = call,
            model = %self.config.name,
            contents = request.contents.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    call = call,
                    model = %self.config.name,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "Gemini request failed"
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;
        let elapsed_ms = start_time.elapsed().as_millis();

        if !status.is_success() {
            tracing::error!(
                call = call,
                model = %self.config.name,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms,
                "Gemini returned an error status"
            );
            return Err(status_error(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ModelError::Decode(e.to_string()))?;

        tracing::info!(
            call = call,
            model = %self.config.name,
            elapsed_ms = elapsed_ms,
            "Gemini request completed"
        );

        Ok(parsed)
    }

    async fn structured(
        &self,
        call: &'static str,
        contents: Vec<WireContent>,
        system_instruction: Option<&str>,
        temperature: f32,
        schema: &Value,
    ) -> Result<Option<String>, ModelError> {
        let request = GenerateContentRequest {
            contents,
            system_instruction: system_instruction.map(WireContent::instruction),
            generation_config: Some(GenerationConfig {
                temperature: Some(temperature),
                response_mime_type: Some(JSON_MIME_TYPE.to_string()),
                response_json_schema: Some(schema.clone()),
            }),
            tools: Vec::new(),
        };

        let response = self.generate(call, &request).await?;
        response.into_text()
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn classify(
        &self,
        content: &CanonicalContent,
        instruction: &str,
    ) -> Result<Option<String>, ModelError> {
        let contents = vec![WireContent::user(&content.with_leading_instruction(instruction))];
        self.structured(
            "classify",
            contents,
            None,
            self.config.classification_temperature,
            &self.classification_schema,
        )
        .await
    }

    async fn analyze(
        &self,
        content: &CanonicalContent,
        system_instruction: &str,
    ) -> Result<Option<String>, ModelError> {
        let contents = vec![WireContent::user(&content.parts())];
        self.structured(
            "analyze",
            contents,
            Some(system_instruction),
            self.config.analysis_temperature,
            &self.analysis_schema,
        )
        .await
    }

    async fn chat_send(&self, request: &ChatRequest) -> Result<Option<String>, ModelError> {
        let mut contents: Vec<WireContent> =
            request.history.iter().map(WireContent::from_message).collect();
        contents.push(WireContent::from_message(&ModelMessage::user_text(
            request.message.as_str(),
        )));

        let wire = GenerateContentRequest {
            contents,
            system_instruction: Some(WireContent::instruction(&request.system_instruction)),
            generation_config: None,
            tools: Vec::new(),
        };

        let response = self.generate("chat", &wire).await?;
        response.into_text()
    }

    async fn grounded_query(&self, prompt: &str) -> Result<GroundedReply, ModelError> {
        let wire = GenerateContentRequest {
            contents: vec![WireContent::from_message(&ModelMessage::user_text(prompt))],
            system_instruction: None,
            generation_config: None,
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        let response = self.generate("grounded_query", &wire).await?;
        let chunks = response.grounding_chunks();
        let text = response.into_text()?;

        tracing::debug!(chunks = chunks.len(), "Grounded query returned citations");

        Ok(GroundedReply { text, chunks })
    }
}

/// JSON schema for a response model, with nested types inlined
fn response_schema<T: JsonSchema>() -> Value {
    SchemaSettings::draft2020_12()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator()
        .into_root_schema_for::<T>()
        .to_value()
}

fn status_error(status: u16, body: String) -> ModelError {
    if (400..500).contains(&status) {
        ModelError::Rejected { status, body }
    } else {
        ModelError::Server { status, body }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart>,
}

impl WireContent {
    fn user(parts: &[ContentPart]) -> Self {
        Self {
            role: Some("user"),
            parts: parts.iter().map(WirePart::from).collect(),
        }
    }

    fn instruction(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![WirePart::Text(text.to_string())],
        }
    }

    fn from_message(message: &ModelMessage) -> Self {
        let role = match message.role {
            ModelRole::User => "user",
            ModelRole::Model => "model",
        };
        Self {
            role: Some(role),
            parts: message.parts.iter().map(WirePart::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum WirePart {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<&ContentPart> for WirePart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => WirePart::Text(text.clone()),
            ContentPart::InlineBinary { mime_type, data } => WirePart::InlineData(InlineData {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_json_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct WireGroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate
    ///
    /// Fails with `Blocked` when the prompt or the only candidate was stopped
    /// by safety filters without producing text.
    fn into_text(self) -> Result<Option<String>, ModelError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ModelError::Blocked(reason));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(None);
        };

        let text: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            if candidate.finish_reason.as_deref() == Some(SAFETY_FINISH_REASON) {
                return Err(ModelError::Blocked(SAFETY_FINISH_REASON.to_string()));
            }
            return Ok(None);
        }

        Ok(Some(text))
    }

    fn grounding_chunks(&self) -> Vec<GroundingChunk> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| {
                m.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| GroundingChunk {
                        uri: web.uri.clone(),
                        title: web.title.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
