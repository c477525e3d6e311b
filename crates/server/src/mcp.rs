//! JSON-RPC 2.0 tool endpoint (`POST /mcp`).
//!
//! Supports `initialize`, `ping`, `tools/list` and `tools/call`. A failing tool
//! call is still a JSON-RPC success: its result carries `isError: true` and the
//! error kind and message as text content. Protocol problems (unknown method or
//! tool, bad arguments) are JSON-RPC errors.

use std::str::FromStr;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use karma_core::EngineError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    error::error_body,
    requests::{CreateSilenceBody, RemoveSilenceParams},
    AppState,
};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "karma-mcp";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, result: Some(result), error: None, id }
    }

    fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, result: None, error: Some(error), id }
    }
}

/// The tools exposed over `tools/call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    CheckKarma,
    ListAlerts,
    GetAlertsSummary,
    GetAlertDetails,
    GetAlertDetailsMultiCluster,
    ListClusters,
    ListAlertsByCluster,
    SearchAlerts,
    SearchAlertsByContainer,
    SilenceAlert,
    ListSilences,
    RemoveSilence,
}

impl Tool {
    pub const ALL: [Self; 12] = [
        Self::CheckKarma,
        Self::ListAlerts,
        Self::GetAlertsSummary,
        Self::GetAlertDetails,
        Self::GetAlertDetailsMultiCluster,
        Self::ListClusters,
        Self::ListAlertsByCluster,
        Self::SearchAlerts,
        Self::SearchAlertsByContainer,
        Self::SilenceAlert,
        Self::ListSilences,
        Self::RemoveSilence,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckKarma => "check_karma",
            Self::ListAlerts => "list_alerts",
            Self::GetAlertsSummary => "get_alerts_summary",
            Self::GetAlertDetails => "get_alert_details",
            Self::GetAlertDetailsMultiCluster => "get_alert_details_multi_cluster",
            Self::ListClusters => "list_clusters",
            Self::ListAlertsByCluster => "list_alerts_by_cluster",
            Self::SearchAlerts => "search_alerts",
            Self::SearchAlertsByContainer => "search_alerts_by_container",
            Self::SilenceAlert => "silence_alert",
            Self::ListSilences => "list_silences",
            Self::RemoveSilence => "remove_silence",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::CheckKarma => "Check connection to the Karma dashboard",
            Self::ListAlerts => "List alerts, optionally filtered by state (active, suppressed, all)",
            Self::GetAlertsSummary => "Alert counts by severity, state and cluster",
            Self::GetAlertDetails => "All alerts with the given name",
            Self::GetAlertDetailsMultiCluster => {
                "Alerts with the given name grouped by cluster, with an optional cluster filter"
            }
            Self::ListClusters => "Clusters with their alert counts",
            Self::ListAlertsByCluster => "Alerts of one cluster",
            Self::SearchAlerts => "Search alerts by name (substring or exact)",
            Self::SearchAlertsByContainer => {
                "Alerts for a container across clusters, with an optional cluster filter"
            }
            Self::SilenceAlert => "Create a silence from label matchers",
            Self::ListSilences => "List silences across clusters",
            Self::RemoveSilence => "Expire a silence by id",
        }
    }

    fn input_schema(&self) -> Value {
        let (properties, required) = match self {
            Self::CheckKarma | Self::GetAlertsSummary | Self::ListClusters | Self::ListSilences => {
                (json!({}), json!([]))
            }
            Self::ListAlerts => (
                json!({"state": {"type": "string", "enum": ["active", "suppressed", "all"]}}),
                json!([]),
            ),
            Self::GetAlertDetails => (json!({"alert_name": {"type": "string"}}), json!(["alert_name"])),
            Self::GetAlertDetailsMultiCluster => (
                json!({
                    "alert_name": {"type": "string"},
                    "cluster_filter": {"type": "string", "default": ""}
                }),
                json!(["alert_name"]),
            ),
            Self::ListAlertsByCluster => {
                (json!({"cluster_name": {"type": "string"}}), json!(["cluster_name"]))
            }
            Self::SearchAlerts => (
                json!({
                    "pattern": {"type": "string"},
                    "mode": {"type": "string", "enum": ["substring", "exact"]}
                }),
                json!(["pattern"]),
            ),
            Self::SearchAlertsByContainer => (
                json!({
                    "container_name": {"type": "string"},
                    "cluster_filter": {"type": "string", "default": ""}
                }),
                json!(["container_name"]),
            ),
            Self::SilenceAlert => (
                json!({
                    "matchers": {
                        "description": "Matchers such as \"alertname=Foo,cluster=prod\", or a list",
                        "type": ["string", "array"]
                    },
                    "duration": {"type": "string", "description": "e.g. 2h, 90m, 1d"},
                    "comment": {"type": "string"},
                    "cluster": {"type": "string"},
                    "created_by": {"type": "string"}
                }),
                json!(["matchers"]),
            ),
            Self::RemoveSilence => (
                json!({
                    "silence_id": {"type": "string"},
                    "cluster": {"type": "string"}
                }),
                json!(["silence_id"]),
            ),
        };

        json!({"type": "object", "properties": properties, "required": required})
    }

    fn definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

impl FromStr for Tool {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| RpcError::new(INVALID_PARAMS, format!("unknown tool: {s}")))
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Default, Deserialize)]
struct StateArgs {
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlertNameArgs {
    alert_name: String,
    #[serde(default)]
    cluster_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClusterArgs {
    cluster_name: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    pattern: String,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerArgs {
    container_name: String,
    #[serde(default)]
    cluster_filter: Option<String>,
}

/// POST /mcp
pub async fn handle_mcp(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let request: RpcRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            let error = RpcError::new(PARSE_ERROR, format!("Parse error: {e}"));
            return (StatusCode::BAD_REQUEST, Json(RpcResponse::failure(Value::Null, error)))
                .into_response();
        }
    };

    let Some(id) = request.id.clone() else {
        debug!(method = %request.method, "notification acknowledged");
        return StatusCode::ACCEPTED.into_response();
    };

    if request.jsonrpc != JSONRPC_VERSION {
        let error = RpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\"");
        return Json(RpcResponse::failure(id, error)).into_response();
    }

    let response = match dispatch(&state, &request.method, request.params).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(error) => {
            warn!(method = %request.method, code = error.code, error = %error.message, "tool request rejected");
            RpcResponse::failure(id, error)
        }
    };
    Json(response).into_response()
}

async fn dispatch(state: &AppState, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        })),
        "ping" => Ok(json!({})),
        "tools/list" => {
            let tools: Vec<Value> = Tool::ALL.iter().map(Tool::definition).collect();
            Ok(json!({ "tools": tools }))
        }
        "tools/call" => {
            let call: ToolCall = arguments(params)?;
            let tool = call.name.parse::<Tool>()?;
            call_tool(state, tool, call.arguments).await
        }
        other => Err(RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {other}"))),
    }
}

fn arguments<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("invalid arguments: {e}")))
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn tool_result(outcome: Result<String, EngineError>) -> Value {
    match outcome {
        Ok(text) => json!({
            "content": [{"type": "text", "text": text}],
            "isError": false,
        }),
        Err(err) => json!({
            "content": [{"type": "text", "text": render(&error_body(&err))}],
            "isError": true,
        }),
    }
}

async fn call_tool(state: &AppState, tool: Tool, args: Value) -> Result<Value, RpcError> {
    let service = &state.service;
    let ctx = state.context();

    let outcome = match tool {
        Tool::CheckKarma => service.check_upstream(ctx).await.map(|r| render(&r)),
        Tool::ListAlerts => {
            let args: StateArgs = arguments(args)?;
            service.list_alerts(ctx, args.state.as_deref()).await.map(|r| render(&r))
        }
        Tool::GetAlertsSummary => service.alerts_summary(ctx).await.map(|r| render(&r)),
        Tool::GetAlertDetails => {
            let args: AlertNameArgs = arguments(args)?;
            service.alert_details(ctx, &args.alert_name).await.map(|r| render(&r))
        }
        Tool::GetAlertDetailsMultiCluster => {
            let args: AlertNameArgs = arguments(args)?;
            service
                .alert_details_multi_cluster(ctx, &args.alert_name, args.cluster_filter.as_deref())
                .await
                .map(|r| render(&r))
        }
        Tool::ListClusters => service.list_clusters(ctx).await.map(|r| render(&r)),
        Tool::ListAlertsByCluster => {
            let args: ClusterArgs = arguments(args)?;
            service.alerts_by_cluster(ctx, &args.cluster_name).await.map(|r| render(&r))
        }
        Tool::SearchAlerts => {
            let args: SearchArgs = arguments(args)?;
            service
                .search_alerts(ctx, &args.pattern, args.mode.as_deref())
                .await
                .map(|r| render(&r))
        }
        Tool::SearchAlertsByContainer => {
            let args: ContainerArgs = arguments(args)?;
            service
                .search_alerts_by_container(ctx, &args.container_name, args.cluster_filter.as_deref())
                .await
                .map(|r| render(&r))
        }
        Tool::SilenceAlert => {
            let body: CreateSilenceBody = arguments(args)?;
            match body.into_request() {
                Ok(request) => service.silence_alert(ctx, request).await.map(|r| render(&r)),
                Err(err) => Err(err),
            }
        }
        Tool::ListSilences => service.list_silences(ctx).await.map(|r| render(&r)),
        Tool::RemoveSilence => {
            let args: RemoveSilenceParams = arguments(args)?;
            service
                .remove_silence(ctx, &args.id, args.cluster.as_deref())
                .await
                .map(|()| format!("silence {} removed", args.id))
        }
    };

    Ok(tool_result(outcome))
}
