use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::Deserialize;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use super::health::HealthReport;
use crate::{
    silences::types::SilencePayload,
    types::{AlertsDocument, AlertsQuery, RawSilenceEntry},
    upstream::UpstreamError,
};

/// Longest upstream error body carried into an error message.
const MAX_ERROR_BODY: usize = 256;

/// Configuration for the dashboard client.
#[derive(Debug, Clone)]
pub struct KarmaClientConfig {
    /// Karma base URL, e.g. `http://karma.monitoring:8080`.
    pub base_url: String,
    /// Upper bound for a single HTTP exchange.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Maximum number of requests in flight against the dashboard.
    pub concurrent_limit: usize,
}

impl Default for KarmaClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            user_agent: concat!("karma-mcp/", env!("CARGO_PKG_VERSION")).to_string(),
            concurrent_limit: 64,
        }
    }
}

/// Reply to a silence creation request.
#[derive(Debug, Deserialize)]
struct SilenceCreated {
    #[serde(rename = "silenceID")]
    silence_id: String,
}

/// HTTP client for the Karma dashboard API.
///
/// Issues exactly one request per call and never retries; retry policy belongs to
/// the caller. In-flight requests are bounded by a semaphore.
pub struct KarmaClient {
    client: Client,
    base_url: Url,
    concurrent_limit: Arc<Semaphore>,
    config: KarmaClientConfig,
}

/// RAII guard ensuring semaphore permits are always released.
struct PermitGuard {
    _permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        tracing::trace!(
            available_permits = self.semaphore.available_permits(),
            "permit guard dropped"
        );
    }
}

impl KarmaClient {
    /// Creates a client with the default configuration pointing at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidRequest`] if the URL is invalid or the
    /// underlying reqwest client fails to build.
    pub fn new(base_url: &str) -> Result<Self, UpstreamError> {
        Self::with_config(KarmaClientConfig { base_url: base_url.to_string(), ..Default::default() })
    }

    /// Creates a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidRequest`] if the URL is invalid or the
    /// underlying reqwest client fails to build.
    pub fn with_config(config: KarmaClientConfig) -> Result<Self, UpstreamError> {
        let base_url = parse_base_url(&config.base_url)?;

        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::limited(3))
            .user_agent(config.user_agent.clone())
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                UpstreamError::InvalidRequest(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            concurrent_limit: Arc::new(Semaphore::new(config.concurrent_limit.max(1))),
            config,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn config(&self) -> &KarmaClientConfig {
        &self.config
    }

    /// Sanitizes network errors to prevent information disclosure.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else {
            "network error".to_string()
        }
    }

    fn map_send_error(error: &reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Unavailable(Self::sanitize_network_error(error))
        }
    }

    async fn acquire(&self) -> Result<PermitGuard, UpstreamError> {
        let permit = Arc::clone(&self.concurrent_limit).acquire_owned().await.map_err(|_| {
            UpstreamError::Unavailable("client is shutting down".to_string())
        })?;
        Ok(PermitGuard { _permit: permit, semaphore: Arc::clone(&self.concurrent_limit) })
    }

    /// Resolves a path relative to the dashboard base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                UpstreamError::InvalidRequest("base URL cannot carry a path".to_string())
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Fetches the dashboard's alert document with `POST /alerts.json`.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Unavailable`] if the dashboard cannot be reached
    /// - [`UpstreamError::Timeout`] if the request exceeds the configured timeout
    /// - [`UpstreamError::HttpStatus`] for non-success HTTP status codes
    /// - [`UpstreamError::MalformedResponse`] if the body is not a JSON object
    pub async fn fetch_alerts(&self, query: &AlertsQuery) -> Result<AlertsDocument, UpstreamError> {
        let url = self.endpoint(&["alerts.json"])?;
        let _guard = self.acquire().await?;

        tracing::debug!(url = %url, filters = query.filters.len(), "fetching alerts");

        let response = self
            .client
            .post(url)
            .json(query)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        let response = Self::ensure_success(response).await?;

        let body = response.bytes().await.map_err(|e| Self::map_send_error(&e))?;
        AlertsDocument::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, bytes = body.len(), "alerts document failed to parse");
            UpstreamError::MalformedResponse(e.to_string())
        })
    }

    /// Fetches the dashboard's silence listing from `GET /silences.json`.
    ///
    /// The listing includes silences that match no firing alert and ones scheduled to
    /// start later. A `null` body reads as an empty listing.
    ///
    /// # Errors
    ///
    /// As for [`Self::fetch_alerts`]; [`UpstreamError::MalformedResponse`] if the body
    /// is not a list of `{cluster, silence}` entries.
    pub async fn fetch_silences(&self) -> Result<Vec<RawSilenceEntry>, UpstreamError> {
        let url = self.endpoint(&["silences.json"])?;
        let _guard = self.acquire().await?;

        tracing::debug!(url = %url, "fetching silences");

        let response = self.client.get(url).send().await.map_err(|e| Self::map_send_error(&e))?;
        let response = Self::ensure_success(response).await?;

        let body = response.bytes().await.map_err(|e| Self::map_send_error(&e))?;
        serde_json::from_slice::<Option<Vec<RawSilenceEntry>>>(&body)
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                tracing::warn!(error = %e, bytes = body.len(), "silence listing failed to parse");
                UpstreamError::MalformedResponse(e.to_string())
            })
    }

    /// Probes `GET /health`. Never fails: unreachability is reported in the result.
    pub async fn check_health(&self) -> HealthReport {
        let url = match self.endpoint(&["health"]) {
            Ok(url) => url,
            Err(e) => return HealthReport::unreachable(e.to_string(), Duration::ZERO),
        };

        let start = Instant::now();
        let result = self.client.get(url).send().await;
        let latency = start.elapsed();

        match result {
            Ok(response) if response.status().is_success() => {
                HealthReport::reachable(response.status().as_u16(), latency)
            }
            Ok(response) => {
                let status = response.status().as_u16();
                HealthReport::unhealthy(status, format!("HTTP {status}"), latency)
            }
            Err(e) => HealthReport::unreachable(Self::map_send_error(&e).to_string(), latency),
        }
    }

    /// Creates a silence through Karma's alertmanager proxy.
    ///
    /// Returns the silence id assigned by alertmanager.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::HttpStatus`] if alertmanager rejects the silence
    /// - [`UpstreamError::MalformedResponse`] if the reply carries no silence id
    /// - transport errors as for [`Self::fetch_alerts`]
    pub async fn post_silence(
        &self,
        instance: &str,
        payload: &SilencePayload,
    ) -> Result<String, UpstreamError> {
        let url = self.endpoint(&["proxy", "alertmanager", instance, "api", "v2", "silences"])?;
        let _guard = self.acquire().await?;

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        let response = Self::ensure_success(response).await?;

        let created: SilenceCreated = response
            .json()
            .await
            .map_err(|e| UpstreamError::MalformedResponse(format!("silence reply: {e}")))?;
        Ok(created.silence_id)
    }

    /// Expires a silence through Karma's alertmanager proxy.
    ///
    /// # Errors
    ///
    /// [`UpstreamError::HttpStatus`] carries 404 when alertmanager does not know the id.
    pub async fn delete_silence(&self, instance: &str, silence_id: &str) -> Result<(), UpstreamError> {
        let url =
            self.endpoint(&["proxy", "alertmanager", instance, "api", "v2", "silence", silence_id])?;
        let _guard = self.acquire().await?;

        let response =
            self.client.delete(url).send().await.map_err(|e| Self::map_send_error(&e))?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn ensure_success(response: Response) -> Result<Response, UpstreamError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw_text = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "dashboard request failed");
        Err(UpstreamError::HttpStatus(status.as_u16(), truncate_body(raw_text, status)))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, UpstreamError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| UpstreamError::InvalidRequest(format!("invalid dashboard URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UpstreamError::InvalidRequest(format!(
            "dashboard URL must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

fn truncate_body(raw_text: String, status: StatusCode) -> String {
    let text = raw_text.trim();
    if text.is_empty() {
        return status.canonical_reason().unwrap_or_default().to_string();
    }
    if text.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &text[..end])
    } else {
        text.to_string()
    }
}
