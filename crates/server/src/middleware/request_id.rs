//! Request id propagation and per-request access logging.
//!
//! Every request gets an `x-request-id` (kept when the caller sends one, a UUID v4
//! otherwise). The id is echoed on the response and attached to the access log
//! line, so a failed tool call can be matched to its upstream warnings.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header::HeaderValue, HeaderName},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// UUID v4 request ids for [`SetRequestIdLayer`].
#[derive(Clone, Copy, Default)]
pub struct UuidRequestIdGenerator;

impl MakeRequestId for UuidRequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).ok()?))
    }
}

/// Set and propagate layers. Apply propagate first so it runs after set:
///
/// ```ignore
/// let (set_layer, propagate_layer) = create_request_id_layers();
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(propagate_layer)
///     .layer(set_layer);
/// ```
#[must_use]
pub fn create_request_id_layers(
) -> (SetRequestIdLayer<UuidRequestIdGenerator>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestIdGenerator),
        PropagateRequestIdLayer::new(X_REQUEST_ID.clone()),
    )
}

/// Logs one line per request with its id, status and latency.
///
/// Server-side failures (5xx) log at `warn`, everything else at `debug`.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
        .to_string();

    let started = Instant::now();
    let response = next.run(request).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(request_id = %request_id, method = %method, path = %path, status, latency_ms, "request failed");
    } else {
        debug!(request_id = %request_id, method = %method, path = %path, status, latency_ms, "request handled");
    }

    response
}
