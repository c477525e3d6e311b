//! Flattens Karma's grid/group/alert nesting into a flat list of [`Alert`]s.
//!
//! # Precedence
//!
//! ```text
//! labels       = shared.labels  <- group.labels <- alert.labels   (right wins)
//! annotations  = shared.annotations            <- alert.annotations
//! cluster      = labels["cluster"] -> alertmanager[0].cluster -> "unknown"
//! ```
//!
//! Each group and alert is decoded independently. Records that fail to decode are
//! reported as [`DroppedRecord`]s and skipped; processing continues with the next one.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{Alert, AlertState, Severity, UNKNOWN};
use crate::types::{AlertsDocument, RawAlert, RawAlertGroup, RawGrid, RawPairs, UpstreamInstance};

const ALERTNAME_LABEL: &str = "alertname";
const CLUSTER_LABEL: &str = "cluster";
const NAMESPACE_LABEL: &str = "namespace";
const SEVERITY_LABEL: &str = "severity";

/// A record skipped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRecord {
    /// Index of the group in flattened upstream order.
    pub group: usize,
    /// Index of the alert within its group; `None` when the whole group was dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<usize>,
    pub reason: String,
}

/// Output of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Alerts in upstream group order, then alert-within-group order.
    pub alerts: Vec<Alert>,
    pub instances: Vec<UpstreamInstance>,
    pub dropped: Vec<DroppedRecord>,
}

/// Normalizes a fetched document.
#[must_use]
pub fn normalize(document: &AlertsDocument) -> Normalized {
    let mut out = Normalized::default();

    for (group_index, raw_group) in flatten_groups(document).enumerate() {
        let group = match serde_json::from_value::<RawAlertGroup>(raw_group) {
            Ok(group) => group,
            Err(e) => {
                warn!(group = group_index, error = %e, "dropping malformed alert group");
                out.dropped.push(DroppedRecord {
                    group: group_index,
                    alert: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for (alert_index, raw_alert) in group.alerts.iter().enumerate() {
            match serde_json::from_value::<RawAlert>(raw_alert.clone()) {
                Ok(alert) => out.alerts.push(build_alert(&group, &alert)),
                Err(e) => {
                    warn!(
                        group = group_index,
                        alert = alert_index,
                        error = %e,
                        "dropping malformed alert"
                    );
                    out.dropped.push(DroppedRecord {
                        group: group_index,
                        alert: Some(alert_index),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    out.instances = document.instances();

    debug!(
        alerts = out.alerts.len(),
        dropped = out.dropped.len(),
        instances = out.instances.len(),
        "normalized alerts document"
    );

    out
}

/// Yields raw groups from every grid, followed by any flat `groups` entries.
///
/// A grid that is not an object contributes nothing.
fn flatten_groups(document: &AlertsDocument) -> impl Iterator<Item = Value> + '_ {
    document
        .grids
        .iter()
        .flat_map(|grid| {
            serde_json::from_value::<RawGrid>(grid.clone())
                .map(|grid| grid.alert_groups)
                .unwrap_or_default()
        })
        .chain(document.groups.iter().cloned())
}

/// Builds one alert. Maps are constructed fresh for every alert.
fn build_alert(group: &RawAlertGroup, raw: &RawAlert) -> Alert {
    let labels = merge(&[&group.shared.labels, &group.labels, &raw.labels]);
    let annotations = merge(&[&group.shared.annotations, &raw.annotations]);

    let name = non_empty(labels.get(ALERTNAME_LABEL)).unwrap_or(UNKNOWN).to_string();

    let cluster = non_empty(labels.get(CLUSTER_LABEL))
        .or_else(|| raw.alertmanager.iter().map(|am| am.cluster.as_str()).find(|c| !c.is_empty()))
        .unwrap_or(UNKNOWN)
        .to_string();

    let namespace = non_empty(labels.get(NAMESPACE_LABEL)).map(str::to_string);
    let severity = Severity::classify(labels.get(SEVERITY_LABEL).map(String::as_str));
    let state = AlertState::classify(&raw.state);

    let alertmanagers = raw
        .alertmanager
        .iter()
        .filter(|am| !am.name.is_empty())
        .map(|am| am.name.clone())
        .collect();

    Alert {
        name,
        cluster,
        namespace,
        severity,
        state,
        labels,
        annotations,
        starts_at: raw.starts_at.clone(),
        id: raw.id.clone().or_else(|| raw.fingerprint.clone()),
        receiver: raw.receiver.clone().or_else(|| group.receiver.clone()),
        alertmanagers,
        group_id: group.id.clone(),
    }
}

/// Merges pair collections left to right; later layers override earlier ones.
fn merge(layers: &[&RawPairs]) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for layer in layers {
        for (name, value) in layer.iter() {
            merged.insert(name.to_string(), value.to_string());
        }
    }
    merged
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}
