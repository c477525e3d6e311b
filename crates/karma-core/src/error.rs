//! Boundary errors returned by every [`AlertService`](crate::service::AlertService) operation.

use serde::Serialize;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Stable classification of an [`EngineError`], used by renderers and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UpstreamUnavailable,
    UpstreamTimeout,
    UpstreamMalformedResponse,
    InvalidFilter,
    InvalidSilenceRequest,
    SilenceCreationFailed,
    NotFound,
    Cancelled,
}

impl ErrorKind {
    /// Returns a static string representation for responses and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UpstreamMalformedResponse => "upstream_malformed_response",
            Self::InvalidFilter => "invalid_filter",
            Self::InvalidSilenceRequest => "invalid_silence_request",
            Self::SilenceCreationFailed => "silence_creation_failed",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for failures caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFilter | Self::InvalidSilenceRequest | Self::NotFound)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to the protocol- and HTTP-facing collaborators.
///
/// Transport failures are never folded into an empty result: an empty alert list
/// and an unreachable dashboard are distinct outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("upstream returned a malformed response: {0}")]
    UpstreamMalformedResponse(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid silence request: {0}")]
    InvalidSilenceRequest(String),

    #[error("silence creation failed: {0}")]
    SilenceCreationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::UpstreamTimeout(_) => ErrorKind::UpstreamTimeout,
            Self::UpstreamMalformedResponse(_) => ErrorKind::UpstreamMalformedResponse,
            Self::InvalidFilter(_) => ErrorKind::InvalidFilter,
            Self::InvalidSilenceRequest(_) => ErrorKind::InvalidSilenceRequest,
            Self::SilenceCreationFailed(_) => ErrorKind::SilenceCreationFailed,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<UpstreamError> for EngineError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout => Self::UpstreamTimeout("request deadline exceeded".into()),
            UpstreamError::Unavailable(reason) => Self::UpstreamUnavailable(reason),
            UpstreamError::HttpStatus(status, body) if body.is_empty() => {
                Self::UpstreamUnavailable(format!("dashboard responded with HTTP {status}"))
            }
            UpstreamError::HttpStatus(status, body) => {
                Self::UpstreamUnavailable(format!("dashboard responded with HTTP {status}: {body}"))
            }
            UpstreamError::MalformedResponse(reason) => Self::UpstreamMalformedResponse(reason),
            UpstreamError::InvalidRequest(reason) => Self::UpstreamUnavailable(reason),
        }
    }
}
