//! HTTP rendering of engine errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use karma_core::{EngineError, ErrorKind};
use serde_json::json;
use tracing::{debug, warn};

/// Non-standard "client closed request" status used for cancelled calls.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Maps an error kind to its HTTP status.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UpstreamUnavailable
        | ErrorKind::UpstreamMalformedResponse
        | ErrorKind::SilenceCreationFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::InvalidFilter | ErrorKind::InvalidSilenceRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Cancelled => {
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// The `{"error", "message"}` body shared by HTTP responses and tool results.
#[must_use]
pub fn error_body(err: &EngineError) -> serde_json::Value {
    json!({
        "error": err.kind().as_str(),
        "message": err.to_string(),
    })
}

/// Handler error wrapping an [`EngineError`].
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind.is_client_error() {
            debug!(error = %self.0, kind = %kind, "request rejected");
        } else {
            warn!(error = %self.0, kind = %kind, "request failed");
        }

        (status_for(kind), Json(error_body(&self.0))).into_response()
    }
}
