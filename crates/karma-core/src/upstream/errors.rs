use thiserror::Error;

/// Errors that can occur when talking to the Karma dashboard.
///
/// These are transport- and parse-level failures only. Business outcomes such as
/// an unknown silence id are decided one layer up, in [`crate::error::EngineError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The dashboard could not be reached (connection refused, DNS, TLS, reset).
    #[error("Connection failed: {0}")]
    Unavailable(String),

    /// The request did not complete within its deadline.
    #[error("Request timeout")]
    Timeout,

    /// Non-2xx HTTP status.
    ///
    /// First field is the HTTP status code, second is the (truncated) response body.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// The body could not be decoded into the expected document shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be built (bad base URL, unserializable body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl UpstreamError {
    /// Returns `true` if a later attempt may succeed.
    ///
    /// Transient errors include:
    /// - Timeouts (slow dashboard, congested network)
    /// - Connection failures
    /// - HTTP 5xx server errors and HTTP 429 rate limiting
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Unavailable(_) => true,
            Self::HttpStatus(status, _) => (500..=599).contains(status) || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if retrying won't help.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::MalformedResponse(_) | Self::InvalidRequest(_) => true,
            Self::HttpStatus(status, _) => (400..=499).contains(status) && *status != 429,
            _ => false,
        }
    }

    /// Returns the HTTP status if this is a status error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(status, _) => Some(*status),
            _ => None,
        }
    }

    /// Returns a static string representation for log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Timeout => "timeout",
            Self::HttpStatus(..) => "http_status",
            Self::MalformedResponse(_) => "malformed_response",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}
