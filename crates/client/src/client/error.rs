//! Client error types

use serde_json::Value;
use thiserror::Error;

/// Message used when a failed response carries no usable `detail`
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while processing the request.";

/// Message carried by [`ClientError::AuthExpired`]
pub const AUTH_EXPIRED_MESSAGE: &str = "Authentication has expired. Please log in again.";

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error, never retried by this layer
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401 with no refresh token, or the refresh cycle failed. The caller
    /// must authenticate again. `body` is the parsed body of the final 401,
    /// when one was received.
    #[error("{message}")]
    AuthExpired {
        message: String,
        reason: String,
        body: Option<Value>,
    },

    /// Server answered with a non-2xx status
    #[error("{message}")]
    Backend {
        message: String,
        status: u16,
        body: Value,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    pub(crate) fn auth_expired(reason: impl Into<String>, body: Option<Value>) -> Self {
        Self::AuthExpired {
            message: AUTH_EXPIRED_MESSAGE.to_string(),
            reason: reason.into(),
            body,
        }
    }

    /// Create a backend error from a status and parsed body
    pub fn from_response(status: reqwest::StatusCode, body: Value) -> Self {
        Self::Backend {
            message: detail_message(&body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            status: status.as_u16(),
            body,
        }
    }

    /// HTTP status, when the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the caller has to log in again
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }
}

/// Human readable message from a backend body.
///
/// A string `detail` is used as is. A validation list
/// (`[{"msg": "..."}, ...]`) is joined.
pub fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
