//! HTTP middleware for the alert server.

pub mod request_id;

pub use request_id::{create_request_id_layers, log_requests, UuidRequestIdGenerator, X_REQUEST_ID};
