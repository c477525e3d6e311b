//! Karma dashboard mock.
//!
//! Wraps mockito with Karma-specific endpoints (`alerts.json`, `silences.json`,
//! `health`, and the alertmanager silence proxy) and builders for their payloads.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// A mocked Karma dashboard.
pub struct KarmaMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl KarmaMockBuilder {
    /// Creates a builder with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Serves `document` from `POST /alerts.json`, expecting at least one request.
    pub async fn mock_alerts(&mut self, document: &Value) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/alerts.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(document.to_string())
            .expect_at_least(1)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Answers `POST /alerts.json` with `status` exactly `times` times.
    ///
    /// Mocks registered afterwards take over once these hits are used up.
    pub async fn mock_alerts_failure(&mut self, status: usize, body: &str, times: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/alerts.json")
            .with_status(status)
            .with_body(body)
            .expect(times)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Serves a non-JSON body with a 200 status, expecting exactly one request.
    pub async fn mock_alerts_garbage(&mut self) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/alerts.json")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body>Bad Gateway</body></html>")
            .expect(1)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Serves `listing` from `GET /silences.json`, expecting at least one request.
    pub async fn mock_silences(&mut self, listing: &Value) -> &mut Self {
        let mock = self
            .server
            .mock("GET", "/silences.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(listing.to_string())
            .expect_at_least(1)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Answers `GET /silences.json` with `status` exactly `times` times.
    pub async fn mock_silences_failure(&mut self, status: usize, body: &str, times: usize) -> &mut Self {
        let mock = self
            .server
            .mock("GET", "/silences.json")
            .with_status(status)
            .with_body(body)
            .expect(times)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    pub async fn mock_health(&mut self, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock("GET", "/health")
            .with_status(status)
            .with_body("Pong")
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Accepts a silence on `instance`, replying with `silence_id`.
    ///
    /// `expected_body` is matched as partial JSON, so timestamps can be left out.
    pub async fn mock_create_silence(
        &mut self,
        instance: &str,
        silence_id: &str,
        expected_body: Value,
    ) -> &mut Self {
        let mock = self
            .server
            .mock("POST", format!("/proxy/alertmanager/{instance}/api/v2/silences").as_str())
            .match_body(Matcher::PartialJson(expected_body))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "silenceID": silence_id }).to_string())
            .expect(1)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Rejects silences on `instance` with `status` and `reason`.
    pub async fn mock_reject_silence(&mut self, instance: &str, status: usize, reason: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", format!("/proxy/alertmanager/{instance}/api/v2/silences").as_str())
            .with_status(status)
            .with_body(reason)
            .expect(1)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    pub async fn mock_delete_silence(&mut self, instance: &str, silence_id: &str, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock(
                "DELETE",
                format!("/proxy/alertmanager/{instance}/api/v2/silence/{silence_id}").as_str(),
            )
            .with_status(status)
            .expect(1)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Asserts every registered mock saw its expected number of requests.
    pub async fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert_async().await;
        }
    }

    /// Returns `true` once every registered mock has been hit as expected.
    #[must_use]
    pub fn verify_all_called(&self) -> bool {
        self.mocks.iter().all(Mock::matched)
    }
}

fn pairs(entries: &[(String, String)]) -> Value {
    Value::Array(entries.iter().map(|(name, value)| json!({"name": name, "value": value})).collect())
}

/// One alert inside a Karma alert group.
#[derive(Debug, Clone)]
pub struct KarmaAlertBuilder {
    id: Option<String>,
    state: String,
    starts_at: String,
    labels: Vec<(String, String)>,
    annotations: Vec<(String, String)>,
    alertmanagers: Vec<(String, String)>,
}

impl KarmaAlertBuilder {
    #[must_use]
    pub fn new(state: &str) -> Self {
        Self {
            id: None,
            state: state.to_string(),
            starts_at: "2025-09-04T10:00:00Z".to_string(),
            labels: Vec::new(),
            annotations: Vec::new(),
            alertmanagers: Vec::new(),
        }
    }

    #[must_use]
    pub fn active() -> Self {
        Self::new("active")
    }

    #[must_use]
    pub fn suppressed() -> Self {
        Self::new("suppressed")
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn label(mut self, name: &str, value: &str) -> Self {
        self.labels.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn annotation(mut self, name: &str, value: &str) -> Self {
        self.annotations.push((name.to_string(), value.to_string()));
        self
    }

    /// Records the alertmanager instance that reported the alert.
    #[must_use]
    pub fn alertmanager(mut self, name: &str, cluster: &str) -> Self {
        self.alertmanagers.push((name.to_string(), cluster.to_string()));
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        let mut alert = json!({
            "state": self.state,
            "startsAt": self.starts_at,
            "labels": pairs(&self.labels),
            "annotations": pairs(&self.annotations),
            "alertmanager": self
                .alertmanagers
                .iter()
                .map(|(name, cluster)| json!({"name": name, "cluster": cluster, "state": "active"}))
                .collect::<Vec<_>>(),
        });
        if let Some(id) = self.id {
            alert["id"] = Value::String(id);
        }
        alert
    }
}

/// A Karma alert group: group labels, shared labels and annotations, and alerts.
#[derive(Debug, Clone, Default)]
pub struct AlertGroupBuilder {
    id: Option<String>,
    receiver: Option<String>,
    labels: Vec<(String, String)>,
    shared_labels: Vec<(String, String)>,
    shared_annotations: Vec<(String, String)>,
    alerts: Vec<Value>,
}

impl AlertGroupBuilder {
    /// A group keyed by `alertname`, the way Karma groups by default.
    #[must_use]
    pub fn new(alertname: &str) -> Self {
        Self::default().label("alertname", alertname)
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn receiver(mut self, receiver: &str) -> Self {
        self.receiver = Some(receiver.to_string());
        self
    }

    #[must_use]
    pub fn label(mut self, name: &str, value: &str) -> Self {
        self.labels.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn shared_label(mut self, name: &str, value: &str) -> Self {
        self.shared_labels.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn shared_annotation(mut self, name: &str, value: &str) -> Self {
        self.shared_annotations.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn alert(mut self, alert: KarmaAlertBuilder) -> Self {
        self.alerts.push(alert.build());
        self
    }

    /// Adds an alert given as raw JSON, e.g. a deliberately malformed one.
    #[must_use]
    pub fn raw_alert(mut self, alert: Value) -> Self {
        self.alerts.push(alert);
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        let mut group = json!({
            "labels": pairs(&self.labels),
            "shared": {
                "labels": pairs(&self.shared_labels),
                "annotations": pairs(&self.shared_annotations),
            },
            "alerts": self.alerts,
        });
        if let Some(id) = self.id {
            group["id"] = Value::String(id);
        }
        if let Some(receiver) = self.receiver {
            group["receiver"] = Value::String(receiver);
        }
        group
    }
}

/// A full `alerts.json` document.
#[derive(Debug, Clone, Default)]
pub struct AlertsDocumentBuilder {
    groups: Vec<Value>,
    instances: Vec<Value>,
}

impl AlertsDocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn group(mut self, group: AlertGroupBuilder) -> Self {
        self.groups.push(group.build());
        self
    }

    #[must_use]
    pub fn raw_group(mut self, group: Value) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds an alertmanager instance; `error` marks it unhealthy.
    #[must_use]
    pub fn instance(mut self, name: &str, cluster: &str, error: Option<&str>) -> Self {
        self.instances.push(json!({
            "name": name,
            "cluster": cluster,
            "publicURI": format!("http://{name}:9093"),
            "version": "0.27.0",
            "error": error.unwrap_or(""),
        }));
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        json!({
            "grids": [{"labelName": "", "labelValue": "", "alertGroups": self.groups}],
            "upstreams": {"counters": {"total": self.instances.len()}, "instances": self.instances},
            "silences": {},
            "version": "v0.120",
        })
    }
}

/// A `silences.json` listing: `{cluster, alertCount, silence}` entries.
#[derive(Debug, Clone, Default)]
pub struct SilenceListingBuilder {
    entries: Vec<Value>,
}

impl SilenceListingBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a silence under `cluster` that currently matches `alert_count` alerts.
    #[must_use]
    pub fn silence(mut self, cluster: &str, id: &str, matchers: Value, alert_count: usize) -> Self {
        self.entries.push(json!({
            "cluster": cluster,
            "alertCount": alert_count,
            "silence": {
                "id": id,
                "matchers": matchers,
                "startsAt": "2025-09-04T10:00:00Z",
                "endsAt": "2025-09-04T12:00:00Z",
                "createdBy": "ops",
                "comment": "maintenance",
            },
        }));
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        Value::Array(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_karma_mock_builder_creation() {
        let mock = KarmaMockBuilder::new().await;
        assert!(mock.url().starts_with("http://"));
    }

    #[test]
    fn test_alert_builder_shape() {
        let alert = KarmaAlertBuilder::active()
            .id("a1")
            .label("cluster", "prod")
            .alertmanager("am-prod", "prod")
            .build();

        assert_eq!(alert["state"], "active");
        assert_eq!(alert["id"], "a1");
        assert_eq!(alert["labels"][0], json!({"name": "cluster", "value": "prod"}));
        assert_eq!(alert["alertmanager"][0]["cluster"], "prod");
    }

    #[test]
    fn test_document_builder_nests_groups() {
        let document = AlertsDocumentBuilder::new()
            .group(AlertGroupBuilder::new("DiskFull").alert(KarmaAlertBuilder::active()))
            .instance("am-prod", "prod", None)
            .build();

        assert_eq!(document["grids"][0]["alertGroups"].as_array().unwrap().len(), 1);
        assert_eq!(document["upstreams"]["instances"][0]["name"], "am-prod");
    }

    #[test]
    fn test_silence_listing_shape() {
        let listing = SilenceListingBuilder::new().silence("prod", "s1", json!([]), 0).build();

        assert_eq!(listing[0]["cluster"], "prod");
        assert_eq!(listing[0]["silence"]["id"], "s1");
        assert_eq!(listing[0]["alertCount"], 0);
    }
}
