//! Pipeline controller
//!
//! Sequences normalization, classification, analysis and chat session setup
//! for one user session, and routes chat turns and permission answers.
//!
//! State lives behind a mutex that is never held across a model call. Each
//! network-bound operation snapshots what it needs, releases the lock, awaits
//! the model, then re-acquires the lock and applies the result only if the
//! pipeline generation is unchanged. `reset` bumps the generation, so late
//! replies to abandoned requests are dropped.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{
    AnalysisResult, AskOutcome, CanonicalContent, ChatTurn, Classification, DocumentInput,
    PendingEscalation, PointSide,
};
use crate::service::analysis::ContractAnalyzer;
use crate::service::chat::prompts::build_point_query;
use crate::service::chat::{ChatSession, PermissionStep};
use crate::service::classification::DocumentClassifier;
use crate::service::error::AnalysisError;
use crate::service::llm::ModelClient;
use crate::service::normalizer::ContentNormalizer;

pub mod error;

pub use error::PipelineError;

const NOT_A_CONTRACT: &str = "not_a_contract";
const INTERRUPTED: &str = "interrupted";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Identifying,
    Analyzing,
    Ready,
    Failed,
}

impl PipelineState {
    /// Allowed forward transitions; `reset` to `Idle` is always allowed
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Identifying)
                | (Identifying, Analyzing)
                | (Identifying, Failed)
                | (Analyzing, Ready)
                | (Analyzing, Failed)
                | (_, Idle)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Identifying => "identifying",
            PipelineState::Analyzing => "analyzing",
            PipelineState::Ready => "ready",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why the last analysis cycle failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PipelineFailure {
    pub kind: String,
    pub message: String,
}

/// Observable pipeline state
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PipelineSnapshot {
    pub status: PipelineState,
    pub classification: Option<Classification>,
    /// Analysis with both lists in display order
    pub analysis: Option<AnalysisResult>,
    pub failure: Option<PipelineFailure>,
    pub transcript: Vec<ChatTurn>,
    pub pending_escalation: Option<PendingEscalation>,
    pub chat_in_flight: bool,
}

#[derive(Default)]
struct PipelineInner {
    generation: u64,
    status: PipelineState,
    content: Option<Arc<CanonicalContent>>,
    classification: Option<Classification>,
    analysis: Option<AnalysisResult>,
    failure: Option<PipelineFailure>,
    session: Option<ChatSession>,
    chat_in_flight: bool,
}

impl PipelineInner {
    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.status.can_transition_to(next),
            "invalid transition {} -> {}",
            self.status,
            next
        );
        tracing::debug!(from = %self.status, to = %next, generation = self.generation, "Pipeline transition");
        self.status = next;
    }

    fn fail(&mut self, kind: &str, message: String) {
        tracing::warn!(kind = %kind, message = %message, "Analysis cycle failed");
        self.failure = Some(PipelineFailure {
            kind: kind.to_string(),
            message,
        });
        self.transition(PipelineState::Failed);
    }

    fn fail_with(&mut self, err: &AnalysisError) {
        self.fail(err.kind(), err.to_string());
    }

    /// Drop every result, the session and any pending escalation
    fn clear(&mut self) {
        self.content = None;
        self.classification = None;
        self.analysis = None;
        self.failure = None;
        self.session = None;
        self.chat_in_flight = false;
    }

    fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            status: self.status,
            classification: self.classification.clone(),
            analysis: self.analysis.as_ref().map(AnalysisResult::sorted_for_display),
            failure: self.failure.clone(),
            transcript: self
                .session
                .as_ref()
                .map(|s| s.transcript().to_vec())
                .unwrap_or_default(),
            pending_escalation: self
                .session
                .as_ref()
                .and_then(|s| s.pending_escalation().cloned()),
            chat_in_flight: self.chat_in_flight,
        }
    }

    /// Session accepting a chat operation right now
    fn chat_session(&mut self) -> Result<&mut ChatSession, PipelineError> {
        if self.status != PipelineState::Ready {
            return Err(PipelineError::NotReady);
        }
        if self.chat_in_flight {
            return Err(PipelineError::Busy);
        }
        self.session.as_mut().ok_or(PipelineError::NotReady)
    }
}

/// Cleans up an operation whose future was dropped before completion
struct InFlightGuard<'a> {
    inner: &'a Mutex<PipelineInner>,
    generation: u64,
    on_abandon: fn(&mut PipelineInner),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.generation == self.generation {
            (self.on_abandon)(&mut inner);
        }
    }
}

fn abandon_cycle(inner: &mut PipelineInner) {
    if matches!(
        inner.status,
        PipelineState::Identifying | PipelineState::Analyzing
    ) {
        inner.fail(INTERRUPTED, "The analysis was interrupted".to_string());
    }
}

fn abandon_chat(inner: &mut PipelineInner) {
    if inner.chat_in_flight {
        inner.chat_in_flight = false;
        if let Some(session) = inner.session.as_mut() {
            session.abandon_ask();
        }
    }
}

fn abandon_escalation(inner: &mut PipelineInner) {
    if inner.chat_in_flight {
        inner.chat_in_flight = false;
        if let Some(session) = inner.session.as_mut() {
            session.abandon_escalation();
        }
    }
}

/// Top-level state machine for one user session
pub struct PipelineController {
    llm_client: Arc<dyn ModelClient>,
    normalizer: ContentNormalizer,
    classifier: DocumentClassifier,
    analyzer: ContractAnalyzer,
    inner: Mutex<PipelineInner>,
}

impl PipelineController {
    pub fn new(llm_client: Arc<dyn ModelClient>, normalizer: ContentNormalizer) -> Self {
        Self {
            classifier: DocumentClassifier::new(Arc::clone(&llm_client)),
            analyzer: ContractAnalyzer::new(Arc::clone(&llm_client)),
            llm_client,
            normalizer,
            inner: Mutex::new(PipelineInner::default()),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.inner.lock().status
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.inner.lock().snapshot()
    }

    /// Run a full analysis cycle: normalize, classify, analyze, open chat
    ///
    /// Only accepted in `Idle`. Input errors are returned without touching
    /// the pipeline; model failures end the cycle in `Failed` and are
    /// reported in the returned snapshot.
    pub async fn submit_analysis(
        &self,
        input: DocumentInput,
    ) -> Result<PipelineSnapshot, PipelineError> {
        self.ensure_idle()?;

        let content = Arc::new(self.normalizer.normalize(input).map_err(PipelineError::Input)?);

        let generation = {
            let mut inner = self.inner.lock();
            if inner.status != PipelineState::Idle {
                return Err(PipelineError::InvalidState {
                    operation: "submit an analysis",
                    state: inner.status,
                });
            }
            inner.clear();
            inner.generation += 1;
            inner.content = Some(Arc::clone(&content));
            inner.transition(PipelineState::Identifying);
            inner.generation
        };

        let _guard = InFlightGuard {
            inner: &self.inner,
            generation,
            on_abandon: abandon_cycle,
        };

        tracing::info!(generation = generation, content_kind = content.kind(), "Analysis cycle started");

        let classified = self.classifier.classify(&content).await;

        let classification = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::debug!(generation = generation, "Discarding stale classification");
                return Err(PipelineError::Superseded);
            }

            match classified {
                Err(e) => {
                    inner.fail_with(&e);
                    return Ok(inner.snapshot());
                }
                Ok(c) if !c.is_contract => {
                    inner.fail(
                        NOT_A_CONTRACT,
                        format!(
                            "The provided document does not appear to be a contract. It was classified as: \"{}\".",
                            c.contract_type
                        ),
                    );
                    return Ok(inner.snapshot());
                }
                Ok(c) => {
                    inner.classification = Some(c.clone());
                    inner.transition(PipelineState::Analyzing);
                    c
                }
            }
        };

        let analyzed = self
            .analyzer
            .analyze(&content, &classification.contract_type, &classification.language)
            .await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(generation = generation, "Discarding stale analysis");
            return Err(PipelineError::Superseded);
        }

        match analyzed {
            Err(e) => inner.fail_with(&e),
            Ok(analysis) => {
                inner.analysis = Some(analysis);
                inner.session = Some(ChatSession::new(&content, &classification));
                inner.transition(PipelineState::Ready);
                tracing::info!(generation = generation, "Analysis cycle completed");
            }
        }

        Ok(inner.snapshot())
    }

    /// Ask a question about the analyzed document
    pub async fn send_chat_message(&self, message: &str) -> Result<AskOutcome, PipelineError> {
        let (generation, request) = {
            let mut inner = self.inner.lock();
            let request = inner.chat_session()?.begin_ask(message)?;
            inner.chat_in_flight = true;
            (inner.generation, request)
        };

        let _guard = InFlightGuard {
            inner: &self.inner,
            generation,
            on_abandon: abandon_chat,
        };

        let reply = self.llm_client.chat_send(&request).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(generation = generation, "Discarding stale chat reply");
            return Err(PipelineError::Superseded);
        }
        inner.chat_in_flight = false;
        let session = inner.session.as_mut().ok_or(PipelineError::NotReady)?;
        Ok(session.complete_ask(&request.message, reply))
    }

    /// Ask for more detail about one point of the analysis
    pub async fn ask_about_point(
        &self,
        side: PointSide,
        index: usize,
    ) -> Result<AskOutcome, PipelineError> {
        let query = {
            let inner = self.inner.lock();
            let analysis = inner.analysis.as_ref().ok_or(PipelineError::NotReady)?;
            // indexes refer to the display order
            let display = analysis.sorted_for_display();
            let point = display
                .point(side, index)
                .ok_or(PipelineError::PointNotFound { side, index })?;
            build_point_query(&point.description)
        };

        self.send_chat_message(&query).await
    }

    /// Answer the pending web-search permission prompt
    ///
    /// The pending escalation is cleared before the grounded query is sent.
    pub async fn respond_to_permission(&self, granted: bool) -> Result<ChatTurn, PipelineError> {
        let (generation, prompt) = {
            let mut inner = self.inner.lock();
            let prompt = match inner.chat_session()?.begin_permission(granted)? {
                PermissionStep::Declined(turn) => return Ok(turn),
                PermissionStep::Search { prompt } => prompt,
            };
            inner.chat_in_flight = true;
            (inner.generation, prompt)
        };

        let _guard = InFlightGuard {
            inner: &self.inner,
            generation,
            on_abandon: abandon_escalation,
        };

        let reply = self.llm_client.grounded_query(&prompt).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(generation = generation, "Discarding stale web search reply");
            return Err(PipelineError::Superseded);
        }
        inner.chat_in_flight = false;
        let session = inner.session.as_mut().ok_or(PipelineError::NotReady)?;
        Ok(session.complete_escalation(reply))
    }

    /// Discard all pipeline and session state and return to `Idle`
    pub fn reset(&self) -> PipelineSnapshot {
        let mut inner = self.inner.lock();
        inner.clear();
        inner.generation += 1;
        if inner.status != PipelineState::Idle {
            inner.transition(PipelineState::Idle);
        }
        tracing::info!(generation = inner.generation, "Pipeline reset");
        inner.snapshot()
    }

    fn ensure_idle(&self) -> Result<(), PipelineError> {
        let state = self.state();
        if state != PipelineState::Idle {
            return Err(PipelineError::InvalidState {
                operation: "submit an analysis",
                state,
            });
        }
        Ok(())
    }
}
