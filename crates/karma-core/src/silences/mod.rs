//! Silence management.
//!
//! Silences are owned by alertmanager; this module only forwards create/remove
//! requests through Karma's proxy and reads Karma's silence listing.

pub mod duration;
pub mod manager;
pub mod types;

pub use duration::{format_duration, parse_duration};
pub use manager::{instance_for_cluster, silences_from_listing, SilenceManager};
pub use types::{CreatedSilence, Matcher, Silence, SilencePayload, SilenceRequest};
