use serde::{Deserialize, Serialize};

/// Failure of a single pipeline stage (transcription, agent reply, speech).
/// Rate limiting is kept apart so the client can be told about it specifically.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("provider error: {0}")]
    Provider(String),
}

impl StageError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "rate_limited",
            Self::Provider(_) => "provider_error",
        }
    }

    /// Classify a non-success HTTP status from an upstream provider.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited(body),
            _ => Self::Provider(format!("status {status}: {body}")),
        }
    }
}

/// Failure on the client channel.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("receive failed: {0}")]
    Receive(String),
}

/// Client-facing error taxonomy. Rendered as the standard error envelope.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    WebSocket(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::WebSocket(_) => "WEBSOCKET_ERROR",
            Self::RateLimited(_) => "RATE_LIMIT_EXCEEDED",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-equivalent status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::WebSocket(_) => 400,
            Self::RateLimited(_) => 429,
            Self::NotFound(_) => 404,
            Self::Provider(_) | Self::Internal(_) => 500,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        // Unclassified failures never leak their internal text.
        let message = match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        ErrorEnvelope {
            error: ErrorBody {
                code: self.code().to_string(),
                message,
                status: self.status(),
            },
        }
    }
}

impl From<StageError> for AppError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::RateLimited(msg) => Self::RateLimited(msg),
            StageError::Provider(msg) => Self::Provider(msg),
        }
    }
}

/// `{"error": {"code", "message", "status"}}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
}
