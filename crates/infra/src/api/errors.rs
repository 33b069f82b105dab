//! API-specific error types
//!
//! Every failed call surfaces one classified [`ApiError`] carrying the
//! original status code and server message. Nothing is retried here; the
//! only automatic retry is the one-shot token refresh in the client.

use std::time::Duration;

use casefile_common::StoreError;
use casefile_domain::CasefileError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use super::uploads::UploadError;

/// Broad error classes for UI-level handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Transport failures and timeouts; the caller may offer a retry
    Network,
    /// 401/403 and terminated sessions
    Authentication,
    /// 400 with a structured error body
    Validation,
    /// 404
    NotFound,
    /// 5xx
    Server,
    /// Other 4xx, undecodable responses and rejected request bodies
    Client,
    /// Misconfiguration and session storage failures
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Field errors exactly as the server sent them.
    #[error("Validation failed: {errors}")]
    Validation { errors: Value },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },

    /// The session was cleared because the access token could not be renewed.
    #[error("Session terminated: {reason}")]
    SessionTerminated {
        reason: String,
        #[source]
        cause: Option<Box<ApiError>>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid upload: {0}")]
    Upload(#[from] UploadError),
}

impl ApiError {
    /// Classify a non-2xx response.
    ///
    /// `body` is the raw response body; JSON bodies are inspected for a
    /// server message under `error`, `detail` or `message`.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let json = serde_json::from_slice::<Value>(body).ok();
        let message = json
            .as_ref()
            .and_then(server_message)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            });
        let code = status.as_u16();

        match status {
            StatusCode::BAD_REQUEST => Self::Validation {
                errors: json.unwrap_or_else(|| Value::String(message)),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::Auth { status: code, message }
            }
            StatusCode::NOT_FOUND => Self::NotFound(message),
            s if s.is_server_error() => Self::Server { status: code, message },
            _ => Self::Client { status: code, message },
        }
    }

    /// Map a transport failure; `timeout` is the configured request timeout.
    pub fn from_transport(err: CasefileError, timeout: Duration) -> Self {
        match err {
            CasefileError::Timeout(_) => Self::Timeout(timeout),
            CasefileError::Config(msg) | CasefileError::InvalidInput(msg) => {
                Self::InvalidRequest(msg)
            }
            other => Self::Network(other.to_string()),
        }
    }

    pub(crate) fn terminated(reason: impl Into<String>, cause: Option<ApiError>) -> Self {
        Self::SessionTerminated { reason: reason.into(), cause: cause.map(Box::new) }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Auth { .. } | Self::SessionTerminated { .. } => ApiErrorCategory::Authentication,
            Self::Validation { .. } => ApiErrorCategory::Validation,
            Self::NotFound(_) => ApiErrorCategory::NotFound,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } | Self::Decode(_) | Self::InvalidRequest(_) | Self::Upload(_) => {
                ApiErrorCategory::Client
            }
            Self::Config(_) | Self::Storage(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Server { status, .. } | Self::Client { status, .. } => {
                Some(*status)
            }
            Self::Validation { .. } => Some(400),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Whether a UI "try again" affordance makes sense.
    pub fn is_transient(&self) -> bool {
        self.category() == ApiErrorCategory::Network
    }

    /// True when the session was cleared as part of this failure.
    pub fn is_session_terminated(&self) -> bool {
        matches!(self, Self::SessionTerminated { .. })
    }
}

/// First string found under `error`, `detail` or `message`.
pub(crate) fn server_message(body: &Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}
