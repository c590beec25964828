//! Inbound text frames. The only recognised shape is `{"event": "stop"}`.

use serde_json::Value;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    /// The utterance is complete; run the pipeline over the buffered audio.
    Stop,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("Invalid JSON: {0}")]
    Malformed(String),
    #[error("Unsupported control message: {0}")]
    Unsupported(String),
}

impl ControlMessage {
    pub fn parse(text: &str) -> Result<Self, ControlError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ControlError::Malformed(e.to_string()))?;

        match value.get("event").and_then(Value::as_str) {
            Some("stop") => Ok(Self::Stop),
            Some(other) => Err(ControlError::Unsupported(format!("event '{other}'"))),
            None => Err(ControlError::Unsupported("missing 'event' field".into())),
        }
    }
}

impl From<ControlError> for AppError {
    fn from(err: ControlError) -> Self {
        Self::WebSocket(err.to_string())
    }
}
