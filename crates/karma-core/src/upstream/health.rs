use serde::Serialize;
use std::time::Duration;

/// Outcome of a dashboard health probe.
///
/// Produced by [`KarmaClient::check_health`](super::KarmaClient::check_health), which never
/// fails: an unreachable dashboard is a report with `reachable == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub reachable: bool,
    /// Round-trip time of the probe.
    #[serde(rename = "latencyMs", serialize_with = "as_millis", skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    #[must_use]
    pub fn reachable(status_code: u16, latency: Duration) -> Self {
        Self { reachable: true, latency: Some(latency), status_code: Some(status_code), error: None }
    }

    /// The dashboard answered, but not with a success status.
    #[must_use]
    pub fn unhealthy(status_code: u16, error: String, latency: Duration) -> Self {
        Self { reachable: false, latency: Some(latency), status_code: Some(status_code), error: Some(error) }
    }

    /// No HTTP response was received.
    #[must_use]
    pub fn unreachable(error: String, latency: Duration) -> Self {
        Self { reachable: false, latency: Some(latency), status_code: None, error: Some(error) }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn latency_ms(&self) -> Option<u64> {
        self.latency.map(|l| l.as_millis() as u64)
    }
}

#[allow(clippy::ref_option, clippy::cast_possible_truncation)]
fn as_millis<S: serde::Serializer>(latency: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match latency {
        Some(latency) => serializer.serialize_u64(latency.as_millis() as u64),
        None => serializer.serialize_none(),
    }
}
