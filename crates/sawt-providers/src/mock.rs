//! Scripted collaborators for deterministic tests without network calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use sawt_core::errors::StageError;
use sawt_core::stages::{
    AgentReply, Responder, StageFactory, Stages, Synthesizer, Transcriber,
};

/// Pre-programmed outcome of one call.
#[derive(Clone, Debug)]
pub enum MockResponse<T> {
    Ok(T),
    Error(StageError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse<T>>),
}

impl<T> MockResponse<T> {
    pub fn delayed(delay: Duration, inner: MockResponse<T>) -> Self {
        Self::Delay(delay, Box::new(inner))
    }

    pub fn rate_limited() -> Self {
        Self::Error(StageError::RateLimited("mock rate limit".into()))
    }

    pub fn provider_error() -> Self {
        Self::Error(StageError::Provider("mock provider failure".into()))
    }
}

/// Responses handed out in order, one per call.
struct Script<T> {
    responses: Vec<MockResponse<T>>,
    call_count: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(responses: Vec<MockResponse<T>>) -> Self {
        Self {
            responses,
            call_count: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    async fn next(&self, label: &str) -> Result<T, StageError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        let Some(mut current) = self.responses.get(idx) else {
            return Err(StageError::Provider(format!(
                "{label}: no response configured for call {idx}"
            )));
        };

        // Nested delays are unrolled iteratively.
        loop {
            match current {
                MockResponse::Ok(value) => return Ok(value.clone()),
                MockResponse::Error(e) => return Err(e.clone()),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(*duration).await;
                    current = &**inner;
                }
            }
        }
    }
}

pub struct MockTranscriber {
    script: Script<String>,
    inputs: Mutex<Vec<Bytes>>,
}

impl MockTranscriber {
    pub fn new(responses: Vec<MockResponse<String>>) -> Self {
        Self {
            script: Script::new(responses),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(vec![MockResponse::Ok(text.to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.script.call_count()
    }

    /// Audio received so far, one entry per call.
    pub fn inputs(&self) -> Vec<Bytes> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(&self, pcm: Bytes) -> Result<String, StageError> {
        self.inputs.lock().push(pcm);
        self.script.next("MockTranscriber").await
    }
}

pub struct MockResponder {
    script: Script<AgentReply>,
    inputs: Mutex<Vec<String>>,
}

impl MockResponder {
    pub fn new(responses: Vec<MockResponse<AgentReply>>) -> Self {
        Self {
            script: Script::new(responses),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(text: &str, is_directed_at_agent: bool) -> Self {
        Self::new(vec![MockResponse::Ok(AgentReply::new(text, is_directed_at_agent))])
    }

    pub fn call_count(&self) -> usize {
        self.script.call_count()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Responder for MockResponder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn respond(&self, text: &str) -> Result<AgentReply, StageError> {
        self.inputs.lock().push(text.to_string());
        self.script.next("MockResponder").await
    }
}

pub struct MockSynthesizer {
    script: Script<Bytes>,
    inputs: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new(responses: Vec<MockResponse<Bytes>>) -> Self {
        Self {
            script: Script::new(responses),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn audio(bytes: &'static [u8]) -> Self {
        Self::new(vec![MockResponse::Ok(Bytes::from_static(bytes))])
    }

    pub fn call_count(&self) -> usize {
        self.script.call_count()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, StageError> {
        self.inputs.lock().push(text.to_string());
        self.script.next("MockSynthesizer").await
    }
}

/// Hands every session the same collaborators.
pub struct StaticStageFactory {
    stages: Stages,
}

impl StaticStageFactory {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            stages: Stages {
                transcriber,
                responder,
                synthesizer,
            },
        }
    }
}

impl StageFactory for StaticStageFactory {
    fn session_stages(&self) -> Stages {
        self.stages.clone()
    }
}
