//! Silence create/list/remove through the Karma dashboard.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use super::{
    duration::parse_duration,
    types::{CreatedSilence, Silence, SilencePayload, SilenceRequest},
};
use crate::{
    error::EngineError,
    types::{AlertsQuery, RawSilenceEntry, UpstreamInstance},
    upstream::{KarmaClient, RetryPolicy, UpstreamError},
};

const DEFAULT_COMMENT: &str = "Silenced via karma-mcp";

/// Translates silence requests into dashboard calls.
///
/// Holds no silence state of its own: listings are read fresh from the dashboard's
/// silence browser, including silences that match no firing alert, and
/// expiry is left entirely to alertmanager. Reads honour the retry policy; writes are
/// sent exactly once.
pub struct SilenceManager {
    client: Arc<KarmaClient>,
    retry: RetryPolicy,
    default_created_by: String,
}

impl SilenceManager {
    #[must_use]
    pub fn new(
        client: Arc<KarmaClient>,
        retry: RetryPolicy,
        default_created_by: impl Into<String>,
    ) -> Self {
        Self { client, retry, default_created_by: default_created_by.into() }
    }

    /// Checks a request and builds the alertmanager payload, without any network call.
    ///
    /// Returns the payload and the target cluster.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSilenceRequest`] if matchers are empty or unnamed,
    /// the duration is malformed or zero, or no target cluster can be determined.
    pub fn prepare(
        &self,
        request: &SilenceRequest,
        now: DateTime<Utc>,
    ) -> Result<(SilencePayload, String), EngineError> {
        if request.matchers.is_empty() {
            return Err(EngineError::InvalidSilenceRequest(
                "at least one matcher is required".to_string(),
            ));
        }
        if let Some(unnamed) = request.matchers.iter().find(|m| m.name.trim().is_empty()) {
            return Err(EngineError::InvalidSilenceRequest(format!(
                "matcher with value '{}' has no label name",
                unnamed.value
            )));
        }

        let duration = parse_duration(&request.duration)?;
        let span = chrono::Duration::from_std(duration).map_err(|_| {
            EngineError::InvalidSilenceRequest(format!("duration '{}' is too large", request.duration))
        })?;
        let ends_at = now.checked_add_signed(span).ok_or_else(|| {
            EngineError::InvalidSilenceRequest(format!("duration '{}' is too large", request.duration))
        })?;

        let cluster = request.target_cluster().map(str::to_string).ok_or_else(|| {
            EngineError::InvalidSilenceRequest(
                "no target cluster: pass one explicitly or add a cluster=\"...\" matcher".to_string(),
            )
        })?;

        let comment = request.comment.trim();
        let created_by = request
            .created_by
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_created_by);

        let payload = SilencePayload {
            matchers: request.matchers.clone(),
            starts_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            ends_at: ends_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            created_by: created_by.to_string(),
            comment: if comment.is_empty() { DEFAULT_COMMENT.to_string() } else { comment.to_string() },
        };

        Ok((payload, cluster))
    }

    /// Creates a silence and returns the id assigned upstream.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidSilenceRequest`] as for [`Self::prepare`]
    /// - [`EngineError::SilenceCreationFailed`] if alertmanager rejects the silence
    /// - upstream transport errors
    pub async fn create(&self, request: &SilenceRequest) -> Result<CreatedSilence, EngineError> {
        let (payload, cluster) = self.prepare(request, Utc::now())?;
        let instance = self.resolve_instance(&cluster).await?;

        let id = self.client.post_silence(&instance, &payload).await.map_err(|e| match e {
            UpstreamError::HttpStatus(status, body) => {
                warn!(cluster = %cluster, instance = %instance, status, "silence rejected");
                EngineError::SilenceCreationFailed(body)
            }
            other => EngineError::from(other),
        })?;

        info!(
            silence_id = %id,
            cluster = %cluster,
            instance = %instance,
            ends_at = %payload.ends_at,
            "silence created"
        );

        Ok(CreatedSilence {
            id,
            cluster,
            instance,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
        })
    }

    /// Lists every silence the dashboard reports, ordered by cluster then id.
    ///
    /// # Errors
    ///
    /// Returns upstream transport and parse errors.
    pub async fn list(&self) -> Result<Vec<Silence>, EngineError> {
        let entries =
            self.retry.execute("fetch_silences", || self.client.fetch_silences()).await?;
        Ok(silences_from_listing(entries))
    }

    /// Expires a silence.
    ///
    /// When `cluster` is `None` the owning cluster is looked up in the listing.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] if the id is unknown to the listing or to alertmanager
    /// - upstream transport errors
    pub async fn remove(&self, silence_id: &str, cluster: Option<&str>) -> Result<(), EngineError> {
        let silence_id = silence_id.trim();
        if silence_id.is_empty() {
            return Err(EngineError::InvalidSilenceRequest("silence id is required".to_string()));
        }

        let cluster = match cluster.map(str::trim).filter(|c| !c.is_empty()) {
            Some(cluster) => cluster.to_string(),
            None => self
                .list()
                .await?
                .into_iter()
                .find(|s| s.id == silence_id)
                .map(|s| s.cluster)
                .ok_or_else(|| EngineError::NotFound(format!("silence '{silence_id}'")))?,
        };
        let instance = self.resolve_instance(&cluster).await?;

        self.client.delete_silence(&instance, silence_id).await.map_err(|e| match e {
            UpstreamError::HttpStatus(404, _) => {
                EngineError::NotFound(format!("silence '{silence_id}' in cluster '{cluster}'"))
            }
            other => EngineError::from(other),
        })?;

        info!(silence_id = %silence_id, cluster = %cluster, instance = %instance, "silence removed");
        Ok(())
    }

    /// Maps a cluster to an alertmanager instance using the instances `alerts.json` reports.
    async fn resolve_instance(&self, cluster: &str) -> Result<String, EngineError> {
        let query = AlertsQuery::new();
        let document =
            self.retry.execute("fetch_alerts", || self.client.fetch_alerts(&query)).await?;
        Ok(instance_for_cluster(&document.instances(), cluster))
    }
}

/// Picks the alertmanager instance for `cluster`, preferring healthy ones.
///
/// Falls back to the cluster name itself, which Karma also accepts as a proxy target.
#[must_use]
pub fn instance_for_cluster(instances: &[UpstreamInstance], cluster: &str) -> String {
    let in_cluster = || instances.iter().filter(move |i| i.cluster == cluster);
    in_cluster()
        .find(|i| i.is_healthy())
        .or_else(|| in_cluster().next())
        .map_or_else(|| cluster.to_string(), |i| i.name.clone())
}

/// Decodes a `silences.json` listing, tagging each silence with its cluster.
///
/// Entries that do not decode, or carry no id, are skipped with a warning.
#[must_use]
pub fn silences_from_listing(entries: Vec<RawSilenceEntry>) -> Vec<Silence> {
    let mut silences = Vec::with_capacity(entries.len());

    for entry in entries {
        match serde_json::from_value::<Silence>(entry.silence) {
            Ok(silence) if silence.id.is_empty() => {
                warn!(cluster = %entry.cluster, "dropping silence without an id");
            }
            Ok(mut silence) => {
                silence.cluster = entry.cluster;
                silences.push(silence);
            }
            Err(e) => {
                warn!(cluster = %entry.cluster, error = %e, "dropping malformed silence");
            }
        }
    }

    silences.sort_by(|a, b| a.cluster.cmp(&b.cluster).then_with(|| a.id.cmp(&b.id)));
    debug!(silences = silences.len(), "listed silences");
    silences
}
