//! REST routes over [`AlertService`](karma_core::AlertService).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use karma_core::{
    alerts::{Alert, AlertSummary, ClusterCount},
    silences::{CreatedSilence, Silence},
    types::UpstreamInstance,
    upstream::HealthReport,
};

use crate::{
    error::ApiError,
    requests::{
        ContainerBody, CreateSilenceBody, DetailsBody, RemoveSilenceParams, SearchParams,
        StateParams,
    },
    AppState,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/alerts", get(list_alerts))
        .route("/alerts/summary", get(alerts_summary))
        .route("/alerts/by-cluster/:cluster", get(alerts_by_cluster))
        .route("/alerts/by-namespace/:namespace", get(alerts_by_namespace))
        .route("/alerts/by-severity/:severity", get(alerts_by_severity))
        .route("/alerts/search", get(search_alerts))
        .route("/alerts/search/name", post(search_alerts_by_name))
        .route("/alerts/search/container", post(search_alerts_by_container))
        .route("/alerts/details", post(alert_details))
        .route("/clusters", get(list_clusters))
        .route("/upstreams", get(list_upstreams))
        .route("/silences", get(list_silences).post(create_silence).delete(remove_silence))
}

/// GET /health
///
/// Fresh probe of the dashboard; an unreachable dashboard is a 502.
async fn health(State(state): State<AppState>) -> ApiResult<HealthReport> {
    Ok(Json(state.service.check_upstream(state.context()).await?))
}

/// GET /alerts?state=active|suppressed|all
async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> ApiResult<Vec<Alert>> {
    Ok(Json(state.service.list_alerts(state.context(), params.state.as_deref()).await?))
}

async fn alerts_summary(State(state): State<AppState>) -> ApiResult<AlertSummary> {
    Ok(Json(state.service.alerts_summary(state.context()).await?))
}

async fn alerts_by_cluster(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
) -> ApiResult<Vec<Alert>> {
    Ok(Json(state.service.alerts_by_cluster(state.context(), &cluster).await?))
}

async fn alerts_by_namespace(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> ApiResult<Vec<Alert>> {
    Ok(Json(state.service.alerts_by_namespace(state.context(), &namespace).await?))
}

async fn alerts_by_severity(
    State(state): State<AppState>,
    Path(severity): Path<String>,
) -> ApiResult<Vec<Alert>> {
    Ok(Json(state.service.alerts_by_severity(state.context(), &severity).await?))
}

/// GET /alerts/search?pattern=&mode=substring|exact
async fn search_alerts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<Alert>> {
    let alerts =
        state.service.search_alerts(state.context(), &params.pattern, params.mode.as_deref()).await?;
    Ok(Json(alerts))
}

/// POST /alerts/search/name
async fn search_alerts_by_name(
    State(state): State<AppState>,
    Json(params): Json<SearchParams>,
) -> ApiResult<Vec<Alert>> {
    let alerts =
        state.service.search_alerts(state.context(), &params.pattern, params.mode.as_deref()).await?;
    Ok(Json(alerts))
}

async fn search_alerts_by_container(
    State(state): State<AppState>,
    Json(body): Json<ContainerBody>,
) -> ApiResult<Vec<Alert>> {
    let alerts = state
        .service
        .search_alerts_by_container(state.context(), &body.container, body.cluster_filter.as_deref())
        .await?;
    Ok(Json(alerts))
}

/// POST /alerts/details
///
/// A flat list by default; grouped by cluster when `multiCluster` is set. Only the
/// flat form reports an unknown name as 404.
async fn alert_details(
    State(state): State<AppState>,
    Json(body): Json<DetailsBody>,
) -> Result<Response, ApiError> {
    let ctx = state.context();
    if body.multi_cluster {
        let grouped = state
            .service
            .alert_details_multi_cluster(ctx, &body.name, body.cluster_filter.as_deref())
            .await?;
        Ok(Json(grouped).into_response())
    } else {
        Ok(Json(state.service.alert_details(ctx, &body.name).await?).into_response())
    }
}

async fn list_clusters(State(state): State<AppState>) -> ApiResult<Vec<ClusterCount>> {
    Ok(Json(state.service.list_clusters(state.context()).await?))
}

async fn list_upstreams(State(state): State<AppState>) -> ApiResult<Vec<UpstreamInstance>> {
    Ok(Json(state.service.list_upstream_instances(state.context()).await?))
}

async fn list_silences(State(state): State<AppState>) -> ApiResult<Vec<Silence>> {
    Ok(Json(state.service.list_silences(state.context()).await?))
}

async fn create_silence(
    State(state): State<AppState>,
    Json(body): Json<CreateSilenceBody>,
) -> Result<(StatusCode, Json<CreatedSilence>), ApiError> {
    let request = body.into_request()?;
    let created = state.service.silence_alert(state.context(), request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /silences?id=&cluster=
async fn remove_silence(
    State(state): State<AppState>,
    Query(params): Query<RemoveSilenceParams>,
) -> Result<StatusCode, ApiError> {
    state.service.remove_silence(state.context(), &params.id, params.cluster.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
