use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object, mirrors `~/.sawt/settings.json`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SawtSettings {
    pub server: ServerSettings,
    pub transcription: TranscriptionSettings,
    pub agent: AgentSettings,
    pub speech: SpeechSettings,
    pub logging: LoggingSettings,
}

impl SawtSettings {
    /// Reject values that would only fail later at bind or request time.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_send_queue == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxSendQueue must be at least 1".into(),
            ));
        }
        if self.server.heartbeat_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "server.heartbeatIntervalSecs must be at least 1".into(),
            ));
        }
        for (name, url) in [
            ("transcription.baseUrl", &self.transcription.base_url),
            ("agent.baseUrl", &self.agent.base_url),
            ("speech.baseUrl", &self.speech.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SettingsError::InvalidValue(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

/// HTTP/WebSocket listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Outbound frames queued per connection before sends fail.
    pub max_send_queue: usize,
    /// WebSocket ping interval.
    pub heartbeat_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_send_queue: 256,
            heartbeat_interval_secs: 30,
        }
    }
}

/// Hugging Face inference API speech-to-text.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionSettings {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// When set, each submitted utterance is also written here as WAV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_wav_path: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "openai/whisper-base".to_string(),
            api_token: None,
            debug_wav_path: None,
            timeout_secs: 60,
        }
    }
}

/// OpenAI-compatible chat completions endpoint for the conversational agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

/// Google Cloud text-to-speech.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub language_code: String,
    pub voice_name: String,
    pub ssml_gender: String,
    pub audio_encoding: String,
    pub timeout_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            base_url: "https://texttospeech.googleapis.com/v1".to_string(),
            api_key: None,
            language_code: "en-US".to_string(),
            voice_name: "en-US-Neural2-J".to_string(),
            ssml_gender: "MALE".to_string(),
            audio_encoding: "MP3".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    /// `json` or `pretty`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}
