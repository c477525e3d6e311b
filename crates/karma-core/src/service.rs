//! The engine's boundary: every operation exposed to the HTTP, tool and CLI surfaces.
//!
//! Each read operation runs one fresh fetch-normalize-query cycle. Nothing is cached
//! between calls, so two calls against an unchanged dashboard give identical results
//! and [`AlertService::check_upstream`] always reflects a fresh probe.

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::{
    alerts::{
        normalize, Alert, AlertQuery, AlertSummary, ClusterCount, ClusterStats, Normalized,
        SearchMode, StateFilter,
    },
    config::AppConfig,
    error::EngineError,
    silences::{CreatedSilence, Silence, SilenceManager, SilenceRequest},
    types::{AlertsQuery, UpstreamInstance},
    upstream::{HealthReport, KarmaClient, RetryPolicy},
};

/// Deadline and cancellation for one service call.
///
/// The deadline bounds the whole operation, retries included. Firing `cancel`
/// abandons the in-flight upstream call; no partial result is returned.
#[derive(Debug)]
pub struct CallContext {
    deadline: Duration,
    cancel: Option<broadcast::Receiver<()>>,
}

impl CallContext {
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self { deadline, cancel: None }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: broadcast::Receiver<()>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Runs `operation` under this context.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UpstreamTimeout`] when the deadline passes first
    /// - [`EngineError::Cancelled`] when the cancel signal fires first
    /// - whatever `operation` returns
    pub async fn run<T, F>(self, name: &str, operation: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        let deadline = self.deadline;
        let timed = tokio::time::timeout(deadline, operation);

        let outcome = match self.cancel {
            Some(mut cancel) => tokio::select! {
                outcome = timed => outcome,
                () = cancelled(&mut cancel) => {
                    warn!(operation = name, "operation cancelled");
                    return Err(EngineError::Cancelled);
                }
            },
            None => timed.await,
        };

        outcome.unwrap_or_else(|_| {
            let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            warn!(operation = name, deadline_ms, "operation deadline exceeded");
            Err(EngineError::UpstreamTimeout(format!(
                "{name} did not complete within {deadline_ms}ms"
            )))
        })
    }
}

/// Resolves once a cancel signal is received. A dropped sender never cancels.
async fn cancelled(cancel: &mut broadcast::Receiver<()>) {
    loop {
        match cancel.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => return,
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

/// Alert aggregation and filtering engine over one Karma dashboard.
pub struct AlertService {
    client: Arc<KarmaClient>,
    retry: RetryPolicy,
    silences: SilenceManager,
    default_silence_duration: String,
    default_deadline: Duration,
}

impl AlertService {
    #[must_use]
    pub fn new(client: Arc<KarmaClient>, retry: RetryPolicy, default_deadline: Duration) -> Self {
        let silences = SilenceManager::new(Arc::clone(&client), retry, "karma-mcp");
        Self {
            client,
            retry,
            silences,
            default_silence_duration: "2h".to_string(),
            default_deadline,
        }
    }

    /// Builds the service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UpstreamUnavailable`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, EngineError> {
        let client = Arc::new(KarmaClient::with_config(config.client_config())?);
        let retry = config.retry_policy();

        Ok(Self {
            silences: SilenceManager::new(
                Arc::clone(&client),
                retry,
                config.silences.default_created_by.clone(),
            ),
            client,
            retry,
            default_silence_duration: config.silences.default_duration.clone(),
            default_deadline: config.operation_deadline(),
        })
    }

    /// A context with the default deadline and no cancellation.
    #[must_use]
    pub fn context(&self) -> CallContext {
        CallContext::new(self.default_deadline)
    }

    #[must_use]
    pub fn client(&self) -> &KarmaClient {
        &self.client
    }

    /// Fetches and normalizes the current alert set.
    ///
    /// # Errors
    ///
    /// Returns upstream transport and parse errors; never an empty substitute.
    pub async fn snapshot(&self, ctx: CallContext) -> Result<Normalized, EngineError> {
        ctx.run("snapshot", self.fetch()).await
    }

    async fn fetch(&self) -> Result<Normalized, EngineError> {
        let query = AlertsQuery::new();
        let document =
            self.retry.execute("fetch_alerts", || self.client.fetch_alerts(&query)).await?;
        let normalized = normalize(&document);
        debug!(
            alerts = normalized.alerts.len(),
            dropped = normalized.dropped.len(),
            "fetched alerts"
        );
        Ok(normalized)
    }

    async fn query<T>(
        &self,
        ctx: CallContext,
        name: &str,
        view: impl FnOnce(AlertQuery<'_>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        ctx.run(name, async {
            let normalized = self.fetch().await?;
            view(AlertQuery::new(&normalized.alerts))
        })
        .await
    }

    /// Probes the dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UpstreamUnavailable`] when the dashboard is unreachable or
    /// unhealthy.
    pub async fn check_upstream(&self, ctx: CallContext) -> Result<HealthReport, EngineError> {
        ctx.run("check_upstream", async {
            let report = self.client.check_health().await;
            if report.reachable {
                Ok(report)
            } else {
                let cause = report.error.clone().unwrap_or_else(|| "unreachable".to_string());
                Err(EngineError::UpstreamUnavailable(format!(
                    "{} is not reachable: {cause}",
                    self.client.base_url()
                )))
            }
        })
        .await
    }

    /// Alerts in upstream order, optionally restricted to `active`, `suppressed` or `all`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidFilter`] for an unknown state, checked before any fetch.
    pub async fn list_alerts(
        &self,
        ctx: CallContext,
        state: Option<&str>,
    ) -> Result<Vec<Alert>, EngineError> {
        let filter = match state.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<StateFilter>()?,
            None => StateFilter::All,
        };
        self.query(ctx, "list_alerts", |q| Ok(q.list(filter))).await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn alerts_summary(&self, ctx: CallContext) -> Result<AlertSummary, EngineError> {
        self.query(ctx, "alerts_summary", |q| Ok(q.summary())).await
    }

    /// # Errors
    ///
    /// [`EngineError::NotFound`] when no alert carries `name`.
    pub async fn alert_details(
        &self,
        ctx: CallContext,
        name: &str,
    ) -> Result<Vec<Alert>, EngineError> {
        self.query(ctx, "alert_details", |q| q.details(name)).await
    }

    /// # Errors
    ///
    /// Returns upstream errors. An unknown name gives an empty map.
    pub async fn alert_details_multi_cluster(
        &self,
        ctx: CallContext,
        name: &str,
        cluster_filter: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<Alert>>, EngineError> {
        self.query(ctx, "alert_details_multi_cluster", |q| {
            Ok(q.details_multi_cluster(name, cluster_filter))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn multi_cluster_stats(
        &self,
        ctx: CallContext,
        name: &str,
    ) -> Result<BTreeMap<String, ClusterStats>, EngineError> {
        self.query(ctx, "multi_cluster_stats", |q| Ok(q.multi_cluster_stats(name))).await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn list_clusters(&self, ctx: CallContext) -> Result<Vec<ClusterCount>, EngineError> {
        self.query(ctx, "list_clusters", |q| Ok(q.list_clusters())).await
    }

    /// Alertmanager instances the dashboard aggregates.
    ///
    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn list_upstream_instances(
        &self,
        ctx: CallContext,
    ) -> Result<Vec<UpstreamInstance>, EngineError> {
        ctx.run("list_upstream_instances", async { Ok(self.fetch().await?.instances) }).await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn alerts_by_cluster(
        &self,
        ctx: CallContext,
        cluster: &str,
    ) -> Result<Vec<Alert>, EngineError> {
        self.query(ctx, "alerts_by_cluster", |q| Ok(q.by_cluster(cluster))).await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn alerts_by_namespace(
        &self,
        ctx: CallContext,
        namespace: &str,
    ) -> Result<Vec<Alert>, EngineError> {
        self.query(ctx, "alerts_by_namespace", |q| Ok(q.by_namespace(namespace))).await
    }

    /// # Errors
    ///
    /// [`EngineError::InvalidFilter`] for an unknown severity, checked before any fetch.
    pub async fn alerts_by_severity(
        &self,
        ctx: CallContext,
        severity: &str,
    ) -> Result<Vec<Alert>, EngineError> {
        let severity = severity.parse::<crate::alerts::Severity>()?;
        self.query(ctx, "alerts_by_severity", |q| q.by_severity(severity.as_str())).await
    }

    /// Name search; `mode` defaults to substring.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidFilter`] for an unknown mode, checked before any fetch.
    pub async fn search_alerts(
        &self,
        ctx: CallContext,
        pattern: &str,
        mode: Option<&str>,
    ) -> Result<Vec<Alert>, EngineError> {
        let mode = match mode.map(str::trim).filter(|m| !m.is_empty()) {
            Some(raw) => raw.parse::<SearchMode>()?,
            None => SearchMode::Substring,
        };
        self.query(ctx, "search_alerts", |q| Ok(q.search(pattern, mode))).await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn search_alerts_by_container(
        &self,
        ctx: CallContext,
        container: &str,
        cluster_filter: Option<&str>,
    ) -> Result<Vec<Alert>, EngineError> {
        self.query(ctx, "search_alerts_by_container", |q| {
            Ok(q.search_by_container(container, cluster_filter))
        })
        .await
    }

    /// Creates a silence. An empty duration takes the configured default. Never retried.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSilenceRequest`], [`EngineError::SilenceCreationFailed`] or
    /// upstream errors.
    pub async fn silence_alert(
        &self,
        ctx: CallContext,
        mut request: SilenceRequest,
    ) -> Result<CreatedSilence, EngineError> {
        if request.duration.trim().is_empty() {
            request.duration.clone_from(&self.default_silence_duration);
        }
        ctx.run("silence_alert", self.silences.create(&request)).await
    }

    /// # Errors
    ///
    /// Returns upstream errors.
    pub async fn list_silences(&self, ctx: CallContext) -> Result<Vec<Silence>, EngineError> {
        ctx.run("list_silences", self.silences.list()).await
    }

    /// # Errors
    ///
    /// [`EngineError::NotFound`] for an unknown id, or upstream errors.
    pub async fn remove_silence(
        &self,
        ctx: CallContext,
        silence_id: &str,
        cluster: Option<&str>,
    ) -> Result<(), EngineError> {
        ctx.run("remove_silence", self.silences.remove(silence_id, cluster)).await
    }
}
