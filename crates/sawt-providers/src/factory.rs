use std::sync::Arc;

use reqwest::Client;

use sawt_core::stages::{StageFactory, Stages};
use sawt_settings::{AgentSettings, SawtSettings};

use crate::agent::AgentResponder;
use crate::huggingface::HuggingFaceTranscriber;
use crate::speech::GoogleSynthesizer;

/// Production collaborators. Transcriber and synthesizer are stateless and
/// shared; each session gets its own responder so histories never mix.
pub struct ProviderStageFactory {
    client: Client,
    transcriber: Arc<HuggingFaceTranscriber>,
    synthesizer: Arc<GoogleSynthesizer>,
    agent: AgentSettings,
}

impl ProviderStageFactory {
    pub fn from_settings(settings: &SawtSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            transcriber: Arc::new(HuggingFaceTranscriber::new(
                client.clone(),
                &settings.transcription,
            )),
            synthesizer: Arc::new(GoogleSynthesizer::new(client.clone(), &settings.speech)),
            agent: settings.agent.clone(),
            client,
        })
    }
}

impl StageFactory for ProviderStageFactory {
    fn session_stages(&self) -> Stages {
        Stages {
            transcriber: self.transcriber.clone(),
            responder: Arc::new(AgentResponder::new(self.client.clone(), &self.agent)),
            synthesizer: self.synthesizer.clone(),
        }
    }
}
