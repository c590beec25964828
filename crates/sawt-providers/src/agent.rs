//! Conversational agent over an OpenAI-compatible chat completions API.
//!
//! The model is asked for a JSON object carrying both the spoken reply and a
//! judgement of whether the utterance was addressed to the assistant at all.
//! Each responder owns the conversation history of one session.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use sawt_core::errors::StageError;
use sawt_core::stages::{AgentReply, Responder};
use sawt_settings::AgentSettings;

/// Exchanges kept as context for the next request.
const MAX_HISTORY: usize = 20;

const SYSTEM_PROMPT: &str = "You are a helpful voice assistant that answers general questions \
conversationally. Reply with plain conversational text only: no markdown, code or special \
characters, so the reply can be spoken aloud. Keep replies to short sentences, at most three or \
four. The user's words come from speech recognition. Decide whether the user is actually speaking \
to you and whether the transcription makes sense; if it is noise, cross-talk or nonsensical, set \
is_directed_at_agent to false. Respond with a JSON object of the form \
{\"assistant_utterance\": string, \"is_directed_at_agent\": boolean}.";

#[derive(Clone, Debug)]
struct Exchange {
    user: String,
    assistant: String,
}

#[derive(Debug, Deserialize)]
struct ReplyPayload {
    #[serde(default)]
    assistant_utterance: String,
    #[serde(default)]
    is_directed_at_agent: bool,
}

pub struct AgentResponder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    temperature: f64,
    timeout: Duration,
    history: Mutex<Vec<Exchange>>,
}

impl AgentResponder {
    pub fn new(client: Client, settings: &AgentSettings) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().map(SecretString::from),
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    fn build_messages(&self, prompt: &str) -> Vec<Value> {
        let history = self.history.lock();
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(json!({"role": "system", "content": SYSTEM_PROMPT}));
        for exchange in history.iter() {
            messages.push(json!({"role": "user", "content": exchange.user}));
            messages.push(json!({"role": "assistant", "content": exchange.assistant}));
        }
        messages.push(json!({"role": "user", "content": prompt}));
        messages
    }

    fn remember(&self, user: &str, assistant: &str) {
        let mut history = self.history.lock();
        history.push(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            let _ = history.drain(..excess);
        }
    }
}

#[async_trait]
impl Responder for AgentResponder {
    fn name(&self) -> &str {
        "agent"
    }

    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn respond(&self, text: &str) -> Result<AgentReply, StageError> {
        tracing::info!(prompt = %text, "requesting agent response");

        let body = json!({
            "model": self.model,
            "messages": self.build_messages(text),
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
        });

        let mut req = self.client.post(&self.endpoint).timeout(self.timeout).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        let status = resp.status().as_u16();
        let raw = resp
            .text()
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;

        if !(200..300).contains(&status) {
            let err = classify_failure(status, raw);
            tracing::error!(status, error = %err, "agent request failed");
            return Err(err);
        }

        let content = extract_content(&raw)?;
        let reply = parse_reply(&content)?;
        self.remember(text, &reply.text);
        Ok(reply)
    }
}

/// Gemini reports quota exhaustion as `RESOURCE_EXHAUSTED`, not always with a 429.
pub fn classify_failure(status: u16, body: String) -> StageError {
    if body.contains("RESOURCE_EXHAUSTED") {
        return StageError::RateLimited(body);
    }
    StageError::from_status(status, body)
}

fn extract_content(raw: &str) -> Result<String, StageError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| StageError::Provider(format!("invalid completion JSON: {e}")))?;
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StageError::Provider("completion has no message content".into()))
}

/// Parse the model's JSON answer, tolerating a surrounding markdown fence.
pub fn parse_reply(content: &str) -> Result<AgentReply, StageError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let payload: ReplyPayload = serde_json::from_str(unfenced)
        .map_err(|e| StageError::Provider(format!("agent reply is not valid JSON: {e}")))?;

    Ok(AgentReply::new(
        payload.assistant_utterance.trim(),
        payload.is_directed_at_agent,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> AgentSettings {
        AgentSettings {
            base_url: base_url.to_string(),
            model: "test-model".into(),
            api_key: Some("sk-test".into()),
            temperature: 0.0,
            timeout_secs: 5,
        }
    }

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[test]
    fn parse_plain_json() {
        let reply =
            parse_reply(r#"{"assistant_utterance":"Hi there.","is_directed_at_agent":true}"#)
                .unwrap();
        assert_eq!(reply, AgentReply::new("Hi there.", true));
    }

    #[test]
    fn parse_fenced_json() {
        let content = "```json\n{\"assistant_utterance\":\"\",\"is_directed_at_agent\":false}\n```";
        let reply = parse_reply(content).unwrap();
        assert!(!reply.should_speak());
    }

    #[test]
    fn parse_garbage_is_provider_error() {
        assert!(matches!(parse_reply("Sure! Here you go"), Err(StageError::Provider(_))));
    }

    #[test]
    fn resource_exhausted_is_rate_limited() {
        let err = classify_failure(400, r#"{"status":"RESOURCE_EXHAUSTED"}"#.into());
        assert!(err.is_rate_limited());
        assert!(classify_failure(429, String::new()).is_rate_limited());
        assert!(!classify_failure(500, "oops".into()).is_rate_limited());
    }

    #[tokio::test]
    async fn responds_and_records_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"assistant_utterance":"hello there","is_directed_at_agent":true}"#,
            )))
            .mount(&server)
            .await;

        let responder = AgentResponder::new(Client::new(), &settings(&server.uri()));
        let reply = responder.respond("hi").await.unwrap();
        assert_eq!(reply, AgentReply::new("hello there", true));
        assert_eq!(responder.history_len(), 1);

        let _ = responder.respond("again").await.unwrap();
        let received = server.received_requests().await.unwrap();
        let second: Value = serde_json::from_slice(&received[1].body).unwrap();
        let messages = second["messages"].as_array().unwrap();
        // system, previous user, previous assistant, new user
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["content"], "hi");
        assert_eq!(messages[2]["content"], "hello there");
        assert_eq!(messages[3]["content"], "again");
    }

    #[tokio::test]
    async fn rate_limit_does_not_touch_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
            .mount(&server)
            .await;

        let responder = AgentResponder::new(Client::new(), &settings(&server.uri()));
        let err = responder.respond("hi").await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(responder.history_len(), 0);
    }

    #[tokio::test]
    async fn server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let responder = AgentResponder::new(Client::new(), &settings(&server.uri()));
        let err = responder.respond("hi").await.unwrap_err();
        assert!(matches!(err, StageError::Provider(_)));
    }

    #[test]
    fn history_is_bounded() {
        let responder = AgentResponder::new(Client::new(), &settings("http://agent.test"));
        for i in 0..(MAX_HISTORY + 5) {
            responder.remember(&format!("u{i}"), &format!("a{i}"));
        }
        assert_eq!(responder.history_len(), MAX_HISTORY);
        let messages = responder.build_messages("next");
        assert_eq!(messages[1]["content"], "u5");
    }
}
