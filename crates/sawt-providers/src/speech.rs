//! Text-to-speech through the Google Cloud `text:synthesize` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use sawt_core::errors::StageError;
use sawt_core::stages::Synthesizer;
use sawt_settings::SpeechSettings;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

pub struct GoogleSynthesizer {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    language_code: String,
    voice_name: String,
    ssml_gender: String,
    audio_encoding: String,
    timeout: Duration,
}

impl GoogleSynthesizer {
    pub fn new(client: Client, settings: &SpeechSettings) -> Self {
        if settings.api_key.is_none() {
            tracing::warn!("no Google TTS API key configured, synthesis will fail");
        }
        Self {
            client,
            endpoint: format!("{}/text:synthesize", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone().map(SecretString::from),
            language_code: settings.language_code.clone(),
            voice_name: settings.voice_name.clone(),
            ssml_gender: settings.ssml_gender.clone(),
            audio_encoding: settings.audio_encoding.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "input": {"text": text},
            "voice": {
                "languageCode": self.language_code,
                "name": self.voice_name,
                "ssmlGender": self.ssml_gender,
            },
            "audioConfig": {"audioEncoding": self.audio_encoding},
        })
    }
}

#[async_trait]
impl Synthesizer for GoogleSynthesizer {
    fn name(&self) -> &str {
        "google-tts"
    }

    #[instrument(skip(self, text), fields(voice = %self.voice_name, chars = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<Bytes, StageError> {
        if text.trim().is_empty() {
            tracing::error!("empty or whitespace-only text provided for synthesis");
            return Err(StageError::Provider("empty text provided for synthesis".into()));
        }

        let mut req = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&self.request_body(text));
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key.expose_secret());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "speech synthesis failed");
            return Err(StageError::from_status(status, body));
        }

        let parsed: SynthesizeResponse = resp
            .json()
            .await
            .map_err(|e| StageError::Provider(format!("invalid synthesis response: {e}")))?;
        let audio = STANDARD
            .decode(parsed.audio_content)
            .map_err(|e| StageError::Provider(format!("invalid audio encoding: {e}")))?;

        tracing::info!(bytes = audio.len(), "speech synthesis succeeded");
        Ok(Bytes::from(audio))
    }
}
