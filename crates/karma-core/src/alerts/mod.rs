//! Alert normalization and querying.
//!
//! ## Components
//!
//! - **[`normalize`]**: flattens an upstream document into [`Alert`]s
//! - **[`AlertQuery`]**: filters, searches and cross-cluster lookups over one alert set
//! - **[`AlertSummary`]**: severity/state/cluster counts
//!
//! ## Usage
//!
//! ```rust
//! use karma_core::alerts::{normalize, AlertQuery, StateFilter};
//! use karma_core::types::AlertsDocument;
//!
//! let body = br#"{"grids": [{"alertGroups": [{
//!     "labels": [{"name": "alertname", "value": "TargetDown"}],
//!     "alerts": [{"state": "active", "labels": [{"name": "cluster", "value": "prod"}]}]
//! }]}]}"#;
//!
//! let document = AlertsDocument::from_slice(body).unwrap();
//! let normalized = normalize(&document);
//! let query = AlertQuery::new(&normalized.alerts);
//!
//! assert_eq!(query.list(StateFilter::Active).len(), 1);
//! assert_eq!(query.list_clusters()[0].cluster, "prod");
//! ```

pub mod normalizer;
pub mod query;
pub mod summary;
pub mod types;

pub use normalizer::{normalize, DroppedRecord, Normalized};
pub use query::{AlertQuery, ClusterCount, ClusterStats};
pub use summary::{AlertSummary, NameCount};
pub use types::{Alert, AlertState, SearchMode, Severity, StateFilter, UNKNOWN};
