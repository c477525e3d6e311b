//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `KARMA_MCP_CONFIG` env var
//! 3. **Environment variables**: `KARMA_MCP__SECTION__KEY` env vars override specific fields
//! 4. **Legacy `KARMA_URL`**: overrides `karma.url` when set
//!
//! # Configuration Sections
//!
//! - [`KarmaConfig`]: dashboard URL, timeouts and retry policy
//! - [`ServerConfig`]: HTTP server settings (bind address, concurrency)
//! - [`SilenceConfig`]: defaults for new silences
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [karma]
//! url = "http://karma.monitoring.svc:8080"
//! request_timeout_seconds = 10
//!
//! [server]
//! bind_address = "0.0.0.0"
//! bind_port = 8080
//!
//! [silences]
//! default_duration = "4h"
//! ```

use crate::{
    silences::parse_duration,
    upstream::{KarmaClientConfig, RetryPolicy},
};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Karma dashboard connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmaConfig {
    /// Base URL of the Karma dashboard. Must start with `http` or `https`.
    pub url: String,

    /// Upper bound for a single request in seconds. Defaults to `30`.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// TCP connect timeout in seconds. Defaults to `5`.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Retries after a transient read failure. Defaults to `2`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential backoff in milliseconds. Defaults to `100`.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_connect_timeout_seconds() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_user_agent() -> String {
    concat!("karma-mcp/", env!("CARGO_PKG_VERSION")).to_string()
}

/// HTTP server configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port number to listen on. Must be greater than 0. Defaults to `8080`.
    pub bind_port: u16,

    /// Maximum number of requests the server handles at once. Defaults to `100`.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_max_concurrent_requests() -> usize {
    100
}

/// Defaults applied to silence requests that leave them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// Duration used when a request names none, e.g. `"2h"`.
    #[serde(default = "default_silence_duration")]
    pub default_duration: String,

    /// Author recorded on silences created without one.
    #[serde(default = "default_created_by")]
    pub default_created_by: String,
}

fn default_silence_duration() -> String {
    "2h".to_string()
}

fn default_created_by() -> String {
    "karma-mcp".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset, e.g. `info`.
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub karma: KarmaConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub silences: SilenceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for KarmaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            request_timeout_seconds: default_request_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), bind_port: 8080, max_concurrent_requests: 100 }
    }
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self { default_duration: default_silence_duration(), default_created_by: default_created_by() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `KARMA_MCP__` prefix can override any configuration
    /// value. Use `__` as a separator for nested fields (e.g., `KARMA_MCP__SERVER__BIND_PORT=9090`).
    /// `KARMA_URL`, when set, wins over every other source for `karma.url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file(config_path: &str) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("karma.url", "http://localhost:8080")?
            .set_default("karma.request_timeout_seconds", 30)?
            .set_default("karma.connect_timeout_seconds", 5)?
            .set_default("karma.max_retries", 2)?
            .set_default("karma.retry_backoff_ms", 100)?
            .set_default("karma.user_agent", default_user_agent())?
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 8080)?
            .set_default("server.max_concurrent_requests", 100)?
            .set_default("silences.default_duration", "2h")?
            .set_default("silences.default_created_by", "karma-mcp")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("KARMA_MCP").separator("__"))
            .set_override_option("karma.url", std::env::var("KARMA_URL").ok())?
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml` with fallback to defaults.
    ///
    /// The config file path can be overridden using the `KARMA_MCP_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("KARMA_MCP_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed into a valid [`SocketAddr`].
    ///
    /// [`SocketAddr`]: std::net::SocketAddr
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
            .parse()
            .map_err(|_| {
                format!(
                    "Invalid socket address: {}:{}",
                    self.server.bind_address, self.server.bind_port
                )
            })
    }

    /// Per-request timeout for dashboard calls.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.karma.request_timeout_seconds)
    }

    #[must_use]
    pub fn client_config(&self) -> KarmaClientConfig {
        KarmaClientConfig {
            base_url: self.karma.url.clone(),
            request_timeout: self.request_timeout(),
            connect_timeout: Duration::from_secs(self.karma.connect_timeout_seconds),
            user_agent: self.karma.user_agent.clone(),
            ..KarmaClientConfig::default()
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.karma.max_retries, Duration::from_millis(self.karma.retry_backoff_ms))
    }

    /// Deadline for one whole service operation, retries and backoff included.
    #[must_use]
    pub fn operation_deadline(&self) -> Duration {
        let policy = self.retry_policy();
        let attempts = u64::from(policy.max_retries) + 1;
        let backoff: Duration = (0..policy.max_retries).map(|n| policy.backoff(n)).sum();
        Duration::from_secs(self.karma.request_timeout_seconds.saturating_mul(attempts)) + backoff
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// Checks include:
    /// - The dashboard URL is set and uses `http` or `https`
    /// - Timeouts, port and concurrency are greater than zero
    /// - The default silence duration parses
    /// - Logging format is either `"json"` or `"pretty"`
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let url = self.karma.url.trim();
        if url.is_empty() {
            return Err("Karma URL is not configured".to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("Invalid Karma URL: {url}"));
        }

        if self.karma.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        if self.karma.connect_timeout_seconds == 0 {
            return Err("Connect timeout must be greater than 0".to_string());
        }

        if self.server.max_concurrent_requests == 0 {
            return Err("Max concurrent requests must be greater than 0".to_string());
        }

        if self.server.bind_port == 0 {
            return Err("Bind port must be greater than 0".to_string());
        }

        if let Err(e) = parse_duration(&self.silences.default_duration) {
            return Err(format!("Invalid default silence duration: {e}"));
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
