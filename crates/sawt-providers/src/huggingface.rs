//! Speech-to-text through the Hugging Face inference API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

use sawt_core::audio;
use sawt_core::errors::StageError;
use sawt_core::stages::Transcriber;
use sawt_settings::TranscriptionSettings;

pub struct HuggingFaceTranscriber {
    client: Client,
    endpoint: String,
    model: String,
    token: Option<SecretString>,
    timeout: Duration,
    debug_wav_path: Option<PathBuf>,
}

impl HuggingFaceTranscriber {
    pub fn new(client: Client, settings: &TranscriptionSettings) -> Self {
        if settings.api_token.is_none() {
            tracing::warn!("no Hugging Face API token configured, requests will be anonymous");
        }
        Self {
            client,
            endpoint: format!(
                "{}/{}",
                settings.base_url.trim_end_matches('/'),
                settings.model
            ),
            model: settings.model.clone(),
            token: settings.api_token.clone().map(SecretString::from),
            timeout: Duration::from_secs(settings.timeout_secs),
            debug_wav_path: settings.debug_wav_path.as_ref().map(PathBuf::from),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Keep a copy of the last submitted utterance on disk. Never fails the turn.
    async fn write_debug_wav(&self, wav: &[u8]) {
        let Some(path) = &self.debug_wav_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to create debug WAV directory");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(path, wav).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to write debug WAV");
        }
    }
}

#[async_trait]
impl Transcriber for HuggingFaceTranscriber {
    fn name(&self) -> &str {
        "huggingface"
    }

    #[instrument(skip(self, pcm), fields(model = %self.model, bytes = pcm.len()))]
    async fn transcribe(&self, pcm: Bytes) -> Result<String, StageError> {
        let wav = audio::wrap_wav(&pcm)
            .map_err(|e| StageError::Provider(format!("wav encoding failed: {e}")))?;
        self.write_debug_wav(&wav).await;

        let mut req = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "audio/wav")
            .timeout(self.timeout)
            .body(wav);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, body = %body, "Hugging Face transcription failed");
            return Err(StageError::from_status(status, body));
        }

        parse_transcription(&body)
    }
}

/// The API answers with either `{"text": ...}` or a list of segments.
pub fn parse_transcription(body: &str) -> Result<String, StageError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| StageError::Provider(format!("invalid transcription JSON: {e}")))?;

    match value {
        Value::Object(ref map) => map
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StageError::Provider("transcription response has no text".into())),
        Value::Array(parts) => Ok(parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect()),
        other => Err(StageError::Provider(format!(
            "unexpected transcription response: {other}"
        ))),
    }
}
