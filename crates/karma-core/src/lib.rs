//! # Karma Core
//!
//! Alert aggregation and filtering engine over a Karma alert dashboard.
//!
//! This crate provides:
//!
//! - **[`upstream`]**: the dashboard client (alert fetch, health probe, silence writes)
//!   and the read-path retry policy.
//!
//! - **[`alerts`]**: normalization of Karma's nested alert groups into flat [`Alert`]
//!   records, plus filtering, search, summaries and multi-cluster lookups.
//!
//! - **[`silences`]**: silence create/list/remove through Karma's alertmanager proxy.
//!
//! - **[`service`]**: [`AlertService`], the boundary every outer surface calls, with
//!   per-call deadlines and cancellation.
//!
//! - **[`config`]**: layered configuration (defaults, TOML file, environment).
//!
//! ## Request Flow
//!
//! ```text
//! Caller (HTTP / tool endpoint / CLI)
//!       │
//!       ▼
//! ┌──────────────┐
//! │ AlertService │ ─── bad filter ──► InvalidFilter
//! │ (CallContext)│ ─── deadline ────► UpstreamTimeout
//! └──────┬───────┘ ─── cancel ──────► Cancelled
//!        │
//!        ▼
//! ┌──────────────┐
//! │ RetryPolicy  │ ─── transient ──► backoff, retry
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │ KarmaClient  │ ─── POST /alerts.json
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │  normalize   │ ─── bad record ──► DroppedRecord (warn)
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │  AlertQuery  │
//! └──────┬───────┘
//!        ▼
//!   Derived view
//! ```
//!
//! [`Alert`]: alerts::Alert
//! [`AlertService`]: service::AlertService

pub mod alerts;
pub mod config;
pub mod error;
pub mod service;
pub mod silences;
pub mod types;
pub mod upstream;

pub use error::{EngineError, ErrorKind};
pub use service::{AlertService, CallContext};
