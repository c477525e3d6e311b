//! HTTP surface of the Karma alert engine.
//!
//! REST routes ([`api`]) and a JSON-RPC tool endpoint ([`mcp`]) share one
//! [`AppState`]. Handlers are thin: they parse input, call the
//! [`AlertService`](karma_core::AlertService) and render its result or error.

use std::sync::Arc;

use axum::{middleware::from_fn, routing::post, Router};
use karma_core::{AlertService, CallContext};
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer};

pub mod api;
pub mod error;
pub mod mcp;
pub mod middleware;
pub mod requests;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AlertService>,
    shutdown: broadcast::Sender<()>,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<AlertService>, shutdown: broadcast::Sender<()>) -> Self {
        Self { service, shutdown }
    }

    /// Default deadline, cancelled when the server shuts down.
    #[must_use]
    pub fn context(&self) -> CallContext {
        self.service.context().with_cancel(self.shutdown.subscribe())
    }
}

/// Builds the router with request ids, concurrency and body limits and compression.
pub fn create_app(state: AppState, max_concurrent_requests: usize) -> Router {
    let (set_request_id, propagate_request_id) = middleware::create_request_id_layers();

    api::routes()
        .route("/mcp", post(mcp::handle_mcp))
        .with_state(state)
        .layer(from_fn(middleware::log_requests))
        .layer(ConcurrencyLimitLayer::new(max_concurrent_requests))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(propagate_request_id)
        .layer(set_request_id)
}
