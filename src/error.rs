// Error handling module
// Defines the client error taxonomy surfaced to callers

use serde::Deserialize;
use thiserror::Error;

/// Structured error body returned by the API on non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: String,

    /// Field-level validation errors, when the server sends them
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// Decode an error body, falling back to the raw text as the message
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorPayload>(body) {
            Ok(payload) if !payload.message.is_empty() || payload.errors.is_some() => payload,
            _ => ErrorPayload {
                message: body.trim().to_string(),
                errors: None,
            },
        }
    }
}

/// Errors that can occur while talking to the storefront API
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure: no connectivity, timeout, TLS
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Session could not be recovered; the user must log in again
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Non-success response from the API
    #[error("API error: {status} - {}", .payload.message)]
    Api { status: u16, payload: ErrorPayload },

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Credential store failure
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl ClientError {
    /// Stable tag for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "network",
            ClientError::SessionExpired(_) => "session_expired",
            ClientError::Api { .. } => "api",
            ClientError::Decode(_) => "decode",
            ClientError::Storage(_) => "storage",
            ClientError::Config(_) => "config",
            ClientError::Internal(_) => "internal",
        }
    }

    /// Whether the caller should send the user back to the login screen
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::SessionExpired(_) | ClientError::Api { status: 401, .. }
        )
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
