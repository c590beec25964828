use serde::{Deserialize, Serialize};

/// Progress marker sent ahead of a long-running stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEvent {
    TranscriptionStart,
    GetAgentResponseStart,
    TtsStart,
}

impl StatusEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TranscriptionStart => "transcription_start",
            Self::GetAgentResponseStart => "get_agent_response_start",
            Self::TtsStart => "tts_start",
        }
    }
}

/// Speaker attribution on text messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

/// JSON frames pushed to the client. Audio goes out as raw binary frames instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Event { event: StatusEvent },
    Text { role: Role, text: String },
}

impl OutboundMessage {
    pub fn status(event: StatusEvent) -> Self {
        Self::Event { event }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self::Text {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::text(Role::Ai, text)
    }
}

/// Fixed texts shown to the client in place of stage failures.
pub mod markers {
    pub const TRANSCRIPTION_RATE_LIMITED: &str = "[Error: Transcription Rate Limit Exceeded]";
    pub const TRANSCRIPTION_FAILED: &str = "[Error: Transcription Error]";
    pub const AGENT_RATE_LIMITED: &str = "[Error: Agent Model Rate Limit Exceeded]";
    pub const AGENT_PROVIDER_FAILED: &str = "[Error: Agent Model Provider Error]";
    pub const TTS_FAILED: &str = "[Error: TTS Error]";
    pub const NOT_DIRECTED: &str = "[Ignored: Not directed at agent]";
}
