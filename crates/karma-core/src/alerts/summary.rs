//! Statistical summary of an alert set.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::types::{Alert, AlertState, Severity};

/// Number of entries reported in [`AlertSummary::top_alerts`].
pub const TOP_ALERTS_LIMIT: usize = 10;

/// A `(name, count)` pair of [`AlertSummary::top_alerts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Counts over a full alert set.
///
/// `by_severity` and `by_state` always carry every level, zero or not, and each
/// partitions `total` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    #[serde(rename = "totalCount")]
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_state: BTreeMap<AlertState, usize>,
    pub by_cluster: BTreeMap<String, usize>,
    pub unique_alert_names: usize,
    pub top_alerts: Vec<NameCount>,
}

impl AlertSummary {
    #[must_use]
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_state: BTreeMap<AlertState, usize> =
            AlertState::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_cluster: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();

        for alert in alerts {
            *by_severity.entry(alert.severity).or_default() += 1;
            *by_state.entry(alert.state).or_default() += 1;
            *by_cluster.entry(alert.cluster.clone()).or_default() += 1;
            *by_name.entry(alert.name.as_str()).or_default() += 1;
        }

        let unique_alert_names = by_name.len();
        let mut top_alerts: Vec<NameCount> = by_name
            .into_iter()
            .map(|(name, count)| NameCount { name: name.to_string(), count })
            .collect();
        top_alerts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_alerts.truncate(TOP_ALERTS_LIMIT);

        Self { total: alerts.len(), by_severity, by_state, by_cluster, unique_alert_names, top_alerts }
    }

    #[must_use]
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn state_count(&self, state: AlertState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    /// `count` as a percentage of `total`; 0 for an empty set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        count as f64 * 100.0 / self.total as f64
    }
}
