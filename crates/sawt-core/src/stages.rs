//! Pipeline collaborators invoked by a session: speech-to-text, the
//! conversational agent and text-to-speech. Each is a single call with its
//! own failure domain.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::StageError;

/// Reply produced by the conversational agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    /// Whether the utterance was a coherent address to the assistant rather
    /// than noise or cross-talk.
    pub is_directed_at_agent: bool,
}

impl AgentReply {
    pub fn new(text: impl Into<String>, is_directed_at_agent: bool) -> Self {
        Self {
            text: text.into(),
            is_directed_at_agent,
        }
    }

    /// Only directed, non-empty replies are spoken back.
    pub fn should_speak(&self) -> bool {
        self.is_directed_at_agent && !self.text.is_empty()
    }
}

/// Everything one successful turn produced. Discarded once emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnResult {
    pub transcribed_text: String,
    pub agent_reply_text: String,
    pub is_directed_at_agent: bool,
    pub synthesized_audio: Option<Bytes>,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe raw 16 kHz mono s16le PCM.
    async fn transcribe(&self, pcm: Bytes) -> Result<String, StageError>;
}

#[async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &str;

    async fn respond(&self, text: &str) -> Result<AgentReply, StageError>;
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Bytes, StageError>;
}

/// The collaborators owned by one session.
#[derive(Clone)]
pub struct Stages {
    pub transcriber: Arc<dyn Transcriber>,
    pub responder: Arc<dyn Responder>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

/// Builds the collaborators for each new connection. Responders carry
/// conversation history, so implementations usually hand out a fresh one.
pub trait StageFactory: Send + Sync {
    fn session_stages(&self) -> Stages;
}
