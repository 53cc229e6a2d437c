//! Scriptable model client for tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::model::CanonicalContent;
use crate::service::llm::{ChatRequest, GroundedReply, ModelClient, ModelError};

type Reply = Result<Option<String>, ModelError>;

/// Pauses a stubbed call until the test releases it
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// Model client returning scripted replies and recording calls
#[derive(Default)]
pub struct StubModelClient {
    classify_replies: Mutex<VecDeque<Reply>>,
    analyze_replies: Mutex<VecDeque<Reply>>,
    chat_replies: Mutex<VecDeque<Reply>>,
    grounded_replies: Mutex<VecDeque<Result<GroundedReply, ModelError>>>,
    grounded_hook: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    gate: Mutex<Option<Arc<Gate>>>,
    pub classify_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub grounded_calls: AtomicUsize,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub grounded_prompts: Mutex<Vec<String>>,
}

impl StubModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_classify(&self, reply: Reply) -> &Self {
        self.classify_replies.lock().push_back(reply);
        self
    }

    pub fn push_analyze(&self, reply: Reply) -> &Self {
        self.analyze_replies.lock().push_back(reply);
        self
    }

    pub fn push_chat(&self, reply: Reply) -> &Self {
        self.chat_replies.lock().push_back(reply);
        self
    }

    pub fn push_grounded(&self, reply: Result<GroundedReply, ModelError>) -> &Self {
        self.grounded_replies.lock().push_back(reply);
        self
    }

    /// Run `hook` synchronously when a grounded query starts
    pub fn on_grounded_query(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.grounded_hook.lock() = Some(Box::new(hook));
    }

    /// Hold every subsequent call at `gate` until released
    pub fn set_gate(&self, gate: Arc<Gate>) {
        *self.gate.lock() = Some(gate);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn wait_at_gate(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, ModelError>>>) -> Result<T, ModelError> {
        queue.lock().pop_front().unwrap_or_else(|| {
            Err(ModelError::Server {
                status: 500,
                body: "no scripted reply".to_string(),
            })
        })
    }
}

#[async_trait]
impl ModelClient for StubModelClient {
    async fn classify(&self, _content: &CanonicalContent, _instruction: &str) -> Reply {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_at_gate().await;
        Self::next(&self.classify_replies)
    }

    async fn analyze(&self, _content: &CanonicalContent, _system_instruction: &str) -> Reply {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_at_gate().await;
        Self::next(&self.analyze_replies)
    }

    async fn chat_send(&self, request: &ChatRequest) -> Reply {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_requests.lock().push(request.clone());
        self.wait_at_gate().await;
        Self::next(&self.chat_replies)
    }

    async fn grounded_query(&self, prompt: &str) -> Result<GroundedReply, ModelError> {
        if let Some(hook) = self.grounded_hook.lock().as_ref() {
            hook();
        }
        self.grounded_calls.fetch_add(1, Ordering::SeqCst);
        self.grounded_prompts.lock().push(prompt.to_string());
        self.wait_at_gate().await;
        Self::next(&self.grounded_replies)
    }
}
