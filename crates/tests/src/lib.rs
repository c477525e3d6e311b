//! Integration Tests for the Karma Alert Engine
//!
//! This crate contains various test modules:
//!
//! - `alert_engine_tests`: read-path views (listing, summary, filters, search, multi-cluster)
//! - `silence_tests`: silence create/list/remove through the dashboard proxy
//! - `resilience_tests`: unreachable dashboards, retries, deadlines and cancellation
//! - `server_flow_tests`: REST routes and the JSON-RPC tool endpoint end to end
//! - `mock_infrastructure`: a mocked Karma dashboard and fixture documents
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```
//!
//! No live dashboard is needed; every test runs against a local mockito server or a
//! local TCP listener.

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod alert_engine_tests;



#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod server_flow_tests;
