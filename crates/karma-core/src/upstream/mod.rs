//! Communication with the Karma dashboard.
//!
//! - [`KarmaClient`] issues single requests: the alert document and silence listing
//!   fetches, the health check, and silence writes through Karma's alertmanager proxy.
//! - [`RetryPolicy`] adds exponential backoff for transient read failures. The
//!   client itself never retries.
//! - [`UpstreamError`] classifies transport and parse failures.

pub mod errors;
pub mod health;
pub mod http_client;
pub mod retry;

pub use errors::UpstreamError;
pub use health::HealthReport;
pub use http_client::{KarmaClient, KarmaClientConfig};
pub use retry::RetryPolicy;
