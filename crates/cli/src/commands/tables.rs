//! Table rendering for command output.

use std::collections::BTreeMap;

use karma_core::{
    alerts::{Alert, AlertState, AlertSummary, ClusterCount, ClusterStats, Severity},
    silences::{format_duration, Silence},
    types::UpstreamInstance,
};
use prettytable::{row, Table};

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub fn alerts_table(alerts: &[Alert]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Name", "Cluster", "Namespace", "Severity", "State", "Started"]);

    for alert in alerts {
        table.add_row(row![
            alert.name,
            alert.cluster,
            or_dash(alert.namespace.as_deref()),
            alert.severity,
            alert.state,
            or_dash(alert.starts_at.as_deref()),
        ]);
    }

    table
}

pub fn grouped_alerts_table(grouped: &BTreeMap<String, Vec<Alert>>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Cluster", "Name", "Namespace", "Severity", "State", "Container"]);

    for (cluster, alerts) in grouped {
        for alert in alerts {
            table.add_row(row![
                cluster,
                alert.name,
                or_dash(alert.namespace.as_deref()),
                alert.severity,
                alert.state,
                or_dash(alert.label("container")),
            ]);
        }
    }

    table
}

pub fn cluster_stats_table(stats: &BTreeMap<String, ClusterStats>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Cluster", "Total", "Active", "Suppressed"]);

    for (cluster, s) in stats {
        table.add_row(row![cluster, s.total, s.active, s.suppressed]);
    }

    table
}

/// Counts table followed by the most frequent alert names.
pub fn summary_tables(summary: &AlertSummary) -> (Table, Table) {
    let mut counts = Table::new();
    counts.add_row(row!["Group", "Value", "Count", "Share"]);
    counts.add_row(row!["total", "", summary.total, "100.0%"]);

    for severity in Severity::ALL {
        let count = summary.severity_count(severity);
        counts.add_row(row![
            "severity",
            severity,
            count,
            format!("{:.1}%", summary.percentage(count))
        ]);
    }
    for state in AlertState::ALL {
        let count = summary.state_count(state);
        counts.add_row(row!["state", state, count, format!("{:.1}%", summary.percentage(count))]);
    }
    for (cluster, count) in &summary.by_cluster {
        counts.add_row(row![
            "cluster",
            cluster,
            count,
            format!("{:.1}%", summary.percentage(*count))
        ]);
    }

    let mut top = Table::new();
    top.add_row(row!["Alert", "Count"]);
    for entry in &summary.top_alerts {
        top.add_row(row![entry.name, entry.count]);
    }

    (counts, top)
}

pub fn clusters_table(clusters: &[ClusterCount]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Cluster", "Alerts"]);

    for entry in clusters {
        table.add_row(row![entry.cluster, entry.count]);
    }

    table
}

pub fn instances_table(instances: &[UpstreamInstance]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Instance", "Cluster", "Version", "Status"]);

    for instance in instances {
        let status = instance
            .error
            .as_deref()
            .map_or_else(|| "[OK]".to_string(), |e| format!("[ERROR] {e}"));
        table.add_row(row![
            instance.name,
            instance.cluster,
            or_dash(Some(instance.version.as_str())),
            status
        ]);
    }

    table
}

pub fn silences_table(silences: &[Silence]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Cluster", "Matchers", "Ends", "Duration", "Created By", "Comment"]);

    for silence in silences {
        let matchers =
            silence.matchers.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        let span = silence.span().map(format_duration);
        table.add_row(row![
            silence.id,
            silence.cluster,
            matchers,
            or_dash(Some(silence.ends_at.as_str())),
            or_dash(span.as_deref()),
            or_dash(Some(silence.created_by.as_str())),
            or_dash(Some(silence.comment.as_str())),
        ]);
    }

    table
}
