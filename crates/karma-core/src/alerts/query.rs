//! Read-only queries over a normalized alert set.
//!
//! Every operation is a single linear pass that preserves upstream order and
//! returns a fresh collection; the input slice is never reordered or mutated.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{
    summary::AlertSummary,
    types::{Alert, AlertState, SearchMode, Severity, StateFilter},
};
use crate::error::EngineError;

const CONTAINER_LABEL: &str = "container";

/// One entry of [`AlertQuery::list_clusters`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterCount {
    pub cluster: String,
    pub count: usize,
}

/// Per-cluster counts for one alert name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClusterStats {
    pub total: usize,
    pub active: usize,
    pub suppressed: usize,
}

/// Query view borrowing the alerts produced by one fetch cycle.
#[derive(Debug, Clone, Copy)]
pub struct AlertQuery<'a> {
    alerts: &'a [Alert],
}

impl<'a> AlertQuery<'a> {
    #[must_use]
    pub fn new(alerts: &'a [Alert]) -> Self {
        Self { alerts }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    fn select(&self, predicate: impl Fn(&Alert) -> bool) -> Vec<Alert> {
        self.alerts.iter().filter(|a| predicate(a)).cloned().collect()
    }

    /// Alerts matching the state filter.
    #[must_use]
    pub fn list(&self, filter: StateFilter) -> Vec<Alert> {
        self.select(|a| filter.matches(a.state))
    }

    /// Exact, case-sensitive cluster match.
    #[must_use]
    pub fn by_cluster(&self, cluster: &str) -> Vec<Alert> {
        self.select(|a| a.cluster == cluster)
    }

    /// Exact, case-sensitive namespace match. Alerts without a namespace never match.
    #[must_use]
    pub fn by_namespace(&self, namespace: &str) -> Vec<Alert> {
        self.select(|a| a.namespace.as_deref() == Some(namespace))
    }

    /// Case-insensitive severity match.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFilter`] if `severity` is not one of the five levels.
    pub fn by_severity(&self, severity: &str) -> Result<Vec<Alert>, EngineError> {
        let severity: Severity = severity.parse()?;
        Ok(self.select(|a| a.severity == severity))
    }

    /// Case-insensitive name search.
    #[must_use]
    pub fn search(&self, pattern: &str, mode: SearchMode) -> Vec<Alert> {
        let pattern = fold(pattern);
        self.select(|a| {
            let name = fold(&a.name);
            match mode {
                SearchMode::Exact => name == pattern,
                SearchMode::Substring => name.contains(&pattern),
            }
        })
    }

    /// Alerts whose `container` label equals `container`, ignoring case.
    ///
    /// `cluster_filter`, when set, keeps only clusters containing it (case-insensitive).
    #[must_use]
    pub fn search_by_container(&self, container: &str, cluster_filter: Option<&str>) -> Vec<Alert> {
        let container = fold(container);
        let cluster_filter = normalize_filter(cluster_filter);
        self.select(|a| {
            a.label(CONTAINER_LABEL).is_some_and(|c| fold(c) == container)
                && cluster_matches(&a.cluster, cluster_filter.as_deref())
        })
    }

    /// Every alert named `name` (case-insensitive), in upstream order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when no alert carries that name.
    pub fn details(&self, name: &str) -> Result<Vec<Alert>, EngineError> {
        let found = self.search(name, SearchMode::Exact);
        if found.is_empty() {
            return Err(EngineError::NotFound(format!("no alert named '{name}'")));
        }
        Ok(found)
    }

    /// Alerts named `name`, grouped by cluster. No occurrence gives an empty map.
    #[must_use]
    pub fn details_multi_cluster(
        &self,
        name: &str,
        cluster_filter: Option<&str>,
    ) -> BTreeMap<String, Vec<Alert>> {
        let cluster_filter = normalize_filter(cluster_filter);
        let mut by_cluster: BTreeMap<String, Vec<Alert>> = BTreeMap::new();

        for alert in self.search(name, SearchMode::Exact) {
            if cluster_matches(&alert.cluster, cluster_filter.as_deref()) {
                by_cluster.entry(alert.cluster.clone()).or_default().push(alert);
            }
        }

        by_cluster
    }

    /// Active/suppressed counts for `name` in each cluster it fires in.
    #[must_use]
    pub fn multi_cluster_stats(&self, name: &str) -> BTreeMap<String, ClusterStats> {
        self.details_multi_cluster(name, None)
            .into_iter()
            .map(|(cluster, alerts)| {
                let active = alerts.iter().filter(|a| a.state == AlertState::Active).count();
                let stats = ClusterStats {
                    total: alerts.len(),
                    active,
                    suppressed: alerts.len() - active,
                };
                (cluster, stats)
            })
            .collect()
    }

    /// Distinct clusters with their alert counts: descending count, then name.
    #[must_use]
    pub fn list_clusters(&self) -> Vec<ClusterCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for alert in self.alerts {
            *counts.entry(alert.cluster.as_str()).or_default() += 1;
        }

        let mut clusters: Vec<ClusterCount> = counts
            .into_iter()
            .map(|(cluster, count)| ClusterCount { cluster: cluster.to_string(), count })
            .collect();
        clusters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cluster.cmp(&b.cluster)));
        clusters
    }

    #[must_use]
    pub fn summary(&self) -> AlertSummary {
        AlertSummary::from_alerts(self.alerts)
    }
}

/// The one case-folding rule for every case-insensitive predicate: Unicode lowercase.
fn fold(value: &str) -> String {
    value.to_lowercase()
}

fn normalize_filter(filter: Option<&str>) -> Option<String> {
    filter.map(str::trim).filter(|f| !f.is_empty()).map(fold)
}

fn cluster_matches(cluster: &str, filter: Option<&str>) -> bool {
    filter.map_or(true, |f| fold(cluster).contains(f))
}
