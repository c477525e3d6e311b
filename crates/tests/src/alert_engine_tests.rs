//! Integration tests for the read path of `AlertService`.
//!
//! Each test serves a fixture document from a mock dashboard and checks the derived
//! views: listing, summary, cluster/namespace/severity filters, search and
//! multi-cluster lookups.

use std::collections::BTreeSet;

use crate::mock_infrastructure::{
    ctx, multi_cluster_document, service_for, two_group_document, AlertGroupBuilder,
    AlertsDocumentBuilder, KarmaAlertBuilder, KarmaMockBuilder,
};
use karma_core::{
    alerts::{AlertState, Severity, UNKNOWN},
    AlertService, ErrorKind,
};
use serde_json::json;
use serial_test::serial;

async fn serve(document: &serde_json::Value) -> (KarmaMockBuilder, AlertService) {
    let mut mock = KarmaMockBuilder::new().await;
    mock.mock_alerts(document).await;
    let service = service_for(&mock.url());
    (mock, service)
}

#[tokio::test]
#[serial]
async fn test_two_group_listing_and_states() {
    let (_mock, service) = serve(&two_group_document()).await;

    let all = service.list_alerts(ctx(), None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "KubePodCrashLooping");
    assert_eq!(all[0].cluster, "prod");
    assert_eq!(all[0].severity, Severity::Critical);
    assert_eq!(all[0].namespace.as_deref(), Some("payments"));
    assert_eq!(all[0].receiver.as_deref(), Some("pager"));
    assert_eq!(all[0].annotation("summary"), Some("Pod is crash looping"));
    assert_eq!(all[1].name, "HighLatency");
    assert_eq!(all[1].state, AlertState::Suppressed);

    let active = service.list_alerts(ctx(), Some("active")).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "KubePodCrashLooping");

    let suppressed = service.list_alerts(ctx(), Some("suppressed")).await.unwrap();
    assert_eq!(suppressed.len(), 1);
    assert_eq!(suppressed[0].cluster, "staging");
}

#[tokio::test]
#[serial]
async fn test_two_group_clusters_and_severity() {
    let (_mock, service) = serve(&two_group_document()).await;

    let clusters = service.list_clusters(ctx()).await.unwrap();
    let pairs: Vec<(&str, usize)> = clusters.iter().map(|c| (c.cluster.as_str(), c.count)).collect();
    assert_eq!(pairs, vec![("prod", 1), ("staging", 1)]);

    let critical = service.alerts_by_severity(ctx(), "critical").await.unwrap();
    assert_eq!(critical.len(), 1);
    let warning = service.alerts_by_severity(ctx(), "WARNING").await.unwrap();
    assert_eq!(warning.len(), 1);
    let info = service.alerts_by_severity(ctx(), "info").await.unwrap();
    assert!(info.is_empty());

    let by_cluster = service.alerts_by_cluster(ctx(), "prod").await.unwrap();
    assert_eq!(by_cluster.len(), 1);
    assert!(service.alerts_by_cluster(ctx(), "Prod").await.unwrap().is_empty());

    let by_namespace = service.alerts_by_namespace(ctx(), "web").await.unwrap();
    assert_eq!(by_namespace.len(), 1);
    assert_eq!(by_namespace[0].name, "HighLatency");
}

#[tokio::test]
#[serial]
async fn test_summary_partitions_the_listing() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let all = service.list_alerts(ctx(), Some("all")).await.unwrap();
    let summary = service.alerts_summary(ctx()).await.unwrap();

    assert_eq!(summary.total, all.len());
    assert_eq!(summary.by_severity.values().sum::<usize>(), summary.total);
    assert_eq!(summary.by_state.values().sum::<usize>(), summary.total);
    assert_eq!(summary.by_severity.len(), Severity::ALL.len());
    assert_eq!(summary.by_state.len(), AlertState::ALL.len());

    let observed: BTreeSet<&str> = all.iter().map(|a| a.cluster.as_str()).collect();
    let summarized: BTreeSet<&str> = summary.by_cluster.keys().map(String::as_str).collect();
    assert_eq!(observed, summarized);

    assert_eq!(summary.severity_count(Severity::None), 1);
    assert_eq!(summary.top_alerts[0].name, "DiskPressure");
    assert_eq!(summary.top_alerts[0].count, 4);
}

#[tokio::test]
#[serial]
async fn test_record_without_state_is_dropped() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    // Six well-formed records survive; the one without a state is dropped.
    let all = service.list_alerts(ctx(), None).await.unwrap();
    assert_eq!(all.len(), 6);

    let snapshot = service.snapshot(ctx()).await.unwrap();
    assert_eq!(snapshot.dropped.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_cluster_fallback_to_alertmanager() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let dev = service.alerts_by_cluster(ctx(), "dev").await.unwrap();
    assert_eq!(dev.len(), 1);
    assert_eq!(dev[0].alertmanagers, vec!["am-dev".to_string()]);
}

#[tokio::test]
#[serial]
async fn test_search_modes() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let substring = service.search_alerts(ctx(), "diskpressure", None).await.unwrap();
    assert_eq!(substring.len(), 5);

    let exact = service.search_alerts(ctx(), "DiskPressure", Some("exact")).await.unwrap();
    assert_eq!(exact.len(), 4);
    assert!(exact.iter().all(|a| a.name == "DiskPressure"));

    let err = service.search_alerts(ctx(), "DiskPressure", Some("fuzzy")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFilter);
}

#[tokio::test]
#[serial]
async fn test_container_search_ignores_case() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let found = service.search_alerts_by_container(ctx(), "POSTGRES", None).await.unwrap();
    assert_eq!(found.len(), 2);

    let filtered =
        service.search_alerts_by_container(ctx(), "postgres", Some("eu")).await.unwrap();
    assert_eq!(filtered.len(), 2);

    let none = service.search_alerts_by_container(ctx(), "postgres", Some("us")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[serial]
async fn test_multi_cluster_keys_match_exact_search() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let by_cluster =
        service.alert_details_multi_cluster(ctx(), "DiskPressure", None).await.unwrap();
    let exact = service.search_alerts(ctx(), "DiskPressure", Some("exact")).await.unwrap();

    let keys: BTreeSet<&str> = by_cluster.keys().map(String::as_str).collect();
    let clusters: BTreeSet<&str> = exact.iter().map(|a| a.cluster.as_str()).collect();
    assert_eq!(keys, clusters);
    assert_eq!(keys, BTreeSet::from(["dev", "prod-eu", "prod-us"]));
    assert_eq!(by_cluster["prod-eu"].len(), 2);

    let stats = service.multi_cluster_stats(ctx(), "DiskPressure").await.unwrap();
    assert_eq!(stats["prod-eu"].active, 2);
    assert_eq!(stats["prod-us"].suppressed, 1);
    assert_eq!(stats["prod-us"].total, 1);

    let filtered =
        service.alert_details_multi_cluster(ctx(), "DiskPressure", Some("PROD")).await.unwrap();
    assert_eq!(filtered.len(), 2);

    let missing = service.alert_details_multi_cluster(ctx(), "NoSuchAlert", None).await.unwrap();
    assert!(missing.is_empty());
}

#[tokio::test]
#[serial]
async fn test_alert_details_not_found() {
    let (_mock, service) = serve(&two_group_document()).await;

    let details = service.alert_details(ctx(), "kubepodcrashlooping").await.unwrap();
    assert_eq!(details.len(), 1);

    let err = service.alert_details(ctx(), "NoSuchAlert").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[serial]
async fn test_reads_are_idempotent() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let first = service.list_alerts(ctx(), None).await.unwrap();
    let second = service.list_alerts(ctx(), None).await.unwrap();
    assert_eq!(first, second);

    let first = service.alerts_summary(ctx()).await.unwrap();
    let second = service.alerts_summary(ctx()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
#[serial]
async fn test_empty_dashboard_is_not_an_error() {
    let (_mock, service) = serve(&AlertsDocumentBuilder::new().build()).await;

    assert!(service.list_alerts(ctx(), None).await.unwrap().is_empty());
    assert!(service.list_clusters(ctx()).await.unwrap().is_empty());

    let summary = service.alerts_summary(ctx()).await.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.unique_alert_names, 0);
    assert!(summary.top_alerts.is_empty());
}

#[tokio::test]
#[serial]
async fn test_label_precedence_and_unknown_defaults() {
    let document = AlertsDocumentBuilder::new()
        .group(
            AlertGroupBuilder::new("Overridden")
                .label("cluster", "group-cluster")
                .shared_label("cluster", "shared-cluster")
                .shared_label("team", "infra")
                .alert(KarmaAlertBuilder::active().label("cluster", "alert-cluster"))
                .alert(KarmaAlertBuilder::active()),
        )
        .raw_group(json!({"alerts": [{"state": "active"}]}))
        .build();
    let (_mock, service) = serve(&document).await;

    let alerts = service.list_alerts(ctx(), None).await.unwrap();
    assert_eq!(alerts.len(), 3);
    assert_eq!(alerts[0].cluster, "alert-cluster");
    assert_eq!(alerts[0].label("team"), Some("infra"));
    assert_eq!(alerts[1].cluster, "group-cluster");
    assert_eq!(alerts[2].name, UNKNOWN);
    assert_eq!(alerts[2].cluster, UNKNOWN);
    assert_eq!(alerts[2].severity, Severity::Unknown);
}

#[tokio::test]
#[serial]
async fn test_invalid_filters_fail_before_fetch() {
    let mut mock = KarmaMockBuilder::new().await;
    mock.mock_alerts_failure(500, "should not be called", 0).await;
    let service = service_for(&mock.url());

    let err = service.list_alerts(ctx(), Some("firing")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFilter);

    let err = service.alerts_by_severity(ctx(), "sev1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFilter);

    mock.assert_all().await;
}

#[tokio::test]
#[serial]
async fn test_upstream_instances_listing() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    let instances = service.list_upstream_instances(ctx()).await.unwrap();
    assert_eq!(instances.len(), 3);
    assert!(!instances[0].is_healthy());
    assert!(instances[1].is_healthy());
}

#[tokio::test]
#[serial]
async fn test_same_alert_in_two_clusters_scenario() {
    let document = AlertsDocumentBuilder::new()
        .group(
            AlertGroupBuilder::new("KubePodCrashLooping")
                .shared_label("cluster", "prod")
                .shared_label("severity", "critical")
                .alert(KarmaAlertBuilder::active()),
        )
        .group(
            AlertGroupBuilder::new("KubePodCrashLooping")
                .shared_label("cluster", "staging")
                .shared_label("severity", "warning")
                .alert(KarmaAlertBuilder::suppressed()),
        )
        .build();
    let (_mock, service) = serve(&document).await;

    let clusters = service.list_clusters(ctx()).await.unwrap();
    let pairs: Vec<(&str, usize)> = clusters.iter().map(|c| (c.cluster.as_str(), c.count)).collect();
    assert_eq!(pairs, vec![("prod", 1), ("staging", 1)]);

    let by_cluster =
        service.alert_details_multi_cluster(ctx(), "KubePodCrashLooping", None).await.unwrap();
    assert_eq!(by_cluster.keys().collect::<Vec<_>>(), vec!["prod", "staging"]);
    assert_eq!(by_cluster["prod"][0].state, AlertState::Active);
    assert_eq!(by_cluster["staging"][0].state, AlertState::Suppressed);

    let summary = service.alerts_summary(ctx()).await.unwrap();
    let by_severity = serde_json::to_value(&summary.by_severity).unwrap();
    assert_eq!(
        by_severity,
        json!({"critical": 1, "warning": 1, "info": 0, "none": 0, "unknown": 0})
    );
}

#[tokio::test]
#[serial]
async fn test_by_cluster_is_closed() {
    let (_mock, service) = serve(&multi_cluster_document()).await;

    for cluster in ["prod-eu", "prod-us", "dev"] {
        let alerts = service.alerts_by_cluster(ctx(), cluster).await.unwrap();
        assert!(!alerts.is_empty());
        let clusters: BTreeSet<&str> = alerts.iter().map(|a| a.cluster.as_str()).collect();
        assert_eq!(clusters, BTreeSet::from([cluster]));
    }
}

#[tokio::test]
#[serial]
async fn test_severity_and_state_stay_in_their_sets() {
    let document = AlertsDocumentBuilder::new()
        .group(
            AlertGroupBuilder::new("Odd")
                .alert(KarmaAlertBuilder::new("unprocessed").label("severity", "P1"))
                .alert(KarmaAlertBuilder::new("inhibited").label("severity", "Critical"))
                .alert(KarmaAlertBuilder::new("SILENCED")),
        )
        .build();
    let (_mock, service) = serve(&document).await;

    let alerts = service.list_alerts(ctx(), None).await.unwrap();
    let rendered = serde_json::to_value(&alerts).unwrap();
    for alert in rendered.as_array().unwrap() {
        let severity = alert["severity"].as_str().unwrap();
        let state = alert["state"].as_str().unwrap();
        assert!(["critical", "warning", "info", "none", "unknown"].contains(&severity));
        assert!(["active", "suppressed"].contains(&state));
    }

    assert_eq!(alerts[0].severity, Severity::Unknown);
    assert_eq!(alerts[0].state, AlertState::Active);
    assert_eq!(alerts[1].severity, Severity::Critical);
    assert_eq!(alerts[1].state, AlertState::Suppressed);
    assert_eq!(alerts[2].state, AlertState::Suppressed);
}
