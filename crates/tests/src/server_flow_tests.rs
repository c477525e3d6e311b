//! End-to-end flows through the HTTP router: REST routes, the JSON-RPC tool
//! endpoint, and shutdown cancelling in-flight calls.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use serial_test::serial;
use server::{create_app, AppState};
use tokio::sync::broadcast;
use tower::ServiceExt;

use crate::mock_infrastructure::{
    hanging_dashboard, service_for, silence_targets_document, silences_listing, two_group_document,
    KarmaMockBuilder,
};

fn app(url: &str) -> (Router, broadcast::Sender<()>) {
    let (shutdown, _) = broadcast::channel(1);
    let state = AppState::new(Arc::new(service_for(url)), shutdown.clone());
    (create_app(state, 8), shutdown)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn call_tool(app: Router, name: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let (status, body) = send(app, Method::POST, "/mcp", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    body["result"].clone()
}

fn tool_text(result: &Value) -> Value {
    let text = result["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[tokio::test]
#[serial]
async fn test_rest_summary_and_clusters() {
    let mut mock = KarmaMockBuilder::new().await;
    mock.mock_alerts(&two_group_document()).await;
    let (app, _shutdown) = app(&mock.url());

    let (status, summary) = send(app.clone(), Method::GET, "/alerts/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalCount"], 2);
    assert_eq!(summary["byCluster"]["prod"], 1);

    let (status, clusters) = send(app, Method::GET, "/clusters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clusters, json!([{"cluster": "prod", "count": 1}, {"cluster": "staging", "count": 1}]));
}

#[tokio::test]
#[serial]
async fn test_rest_silence_lifecycle() {
    let mut mock = KarmaMockBuilder::new().await;
    mock.mock_alerts(&silence_targets_document()).await;
    mock.mock_silences(&silences_listing()).await;
    mock.mock_create_silence("am-prod", "s-new", json!({"comment": "deploy"})).await;
    mock.mock_delete_silence("am-prod", "s-100", 200).await;
    let (app, _shutdown) = app(&mock.url());

    let (status, created) = send(
        app.clone(),
        Method::POST,
        "/silences",
        Some(json!({"matchers": "alertname=KubePodCrashLooping,cluster=prod", "duration": "30m", "comment": "deploy"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "s-new");
    assert_eq!(created["instance"], "am-prod");

    let (status, listed) = send(app.clone(), Method::GET, "/silences", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 3);

    let (status, _) = send(app.clone(), Method::DELETE, "/silences?id=s-100", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(app, Method::DELETE, "/silences?id=missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    mock.assert_all().await;
}

#[tokio::test]
#[serial]
async fn test_rest_invalid_silence_is_bad_request() {
    let mock = KarmaMockBuilder::new().await;
    let (app, _shutdown) = app(&mock.url());

    let (status, body) =
        send(app, Method::POST, "/silences", Some(json!({"matchers": [], "duration": "1h"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_silence_request");
}

#[tokio::test]
#[serial]
async fn test_tool_endpoint_lists_and_calls_tools() {
    let mut mock = KarmaMockBuilder::new().await;
    mock.mock_alerts(&two_group_document()).await;
    let (app, _shutdown) = app(&mock.url());

    let (status, listed) = send(
        app.clone(),
        Method::POST,
        "/mcp",
        Some(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["result"]["tools"].as_array().unwrap().len(), 12);

    let result = call_tool(app.clone(), "list_alerts_by_cluster", json!({"cluster_name": "staging"})).await;
    assert_eq!(result["isError"], false);
    let alerts = tool_text(&result);
    assert_eq!(alerts[0]["name"], "HighLatency");

    let result =
        call_tool(app.clone(), "search_alerts_by_container", json!({"container_name": "API"})).await;
    assert_eq!(tool_text(&result).as_array().unwrap().len(), 1);

    let result = call_tool(app, "get_alert_details", json!({"alert_name": "Nope"})).await;
    assert_eq!(result["isError"], true);
    assert_eq!(tool_text(&result)["error"], "not_found");
}

#[tokio::test]
#[serial]
async fn test_tool_endpoint_reports_unreachable_dashboard() {
    let (app, _shutdown) = app("http://127.0.0.1:1");

    let result = call_tool(app, "check_karma", json!({})).await;

    assert_eq!(result["isError"], true);
    assert_eq!(tool_text(&result)["error"], "upstream_unavailable");
}

#[tokio::test]
#[serial]
async fn test_shutdown_cancels_in_flight_requests() {
    let (app, shutdown) = app(&hanging_dashboard().await);

    let request = tokio::spawn(send(app, Method::GET, "/alerts", None));

    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = shutdown.send(());
        if request.is_finished() {
            break;
        }
    }

    let (status, body) = request.await.unwrap();
    assert_eq!(status.as_u16(), 499);
    assert_eq!(body["error"], "cancelled");
}
