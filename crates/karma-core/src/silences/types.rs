//! Silence type definitions.

use std::{fmt, str::FromStr, time::Duration};

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

fn default_true() -> bool {
    true
}

/// A label matcher as alertmanager understands it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_regex: bool,
    /// `false` negates the match (`!=`, `!~`).
    #[serde(default = "default_true")]
    pub is_equal: bool,
}

impl Matcher {
    /// `name="value"`.
    #[must_use]
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), is_regex: false, is_equal: true }
    }

    /// `name=~"value"`.
    #[must_use]
    pub fn regex(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), is_regex: true, is_equal: true }
    }

    #[must_use]
    pub fn negated(mut self) -> Self {
        self.is_equal = !self.is_equal;
        self
    }

    /// Returns `true` for a plain `name="value"` matcher.
    #[must_use]
    pub fn is_plain_equality(&self) -> bool {
        self.is_equal && !self.is_regex
    }

    fn operator(&self) -> &'static str {
        match (self.is_equal, self.is_regex) {
            (true, false) => "=",
            (false, false) => "!=",
            (true, true) => "=~",
            (false, true) => "!~",
        }
    }

    /// Parses a comma-separated matcher list such as `alertname=Foo,namespace!~kube-.*`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSilenceRequest`] for the first entry that does not parse.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, EngineError> {
        raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::parse).collect()
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\"{}\"", self.name, self.operator(), self.value)
    }
}

impl FromStr for Matcher {
    type Err = EngineError;

    /// Accepts `name=value`, `name!=value`, `name=~regex` and `name!~regex`.
    /// Surrounding double quotes on the value are stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            EngineError::InvalidSilenceRequest(format!(
                "invalid matcher '{s}', expected name=value, name!=value, name=~regex or name!~regex"
            ))
        };

        let (split_at, operator) = ["!=", "=~", "!~", "="]
            .iter()
            .filter_map(|op| s.find(op).map(|idx| (idx, *op)))
            .min_by_key(|(idx, op)| (*idx, std::cmp::Reverse(op.len())))
            .ok_or_else(invalid)?;

        let name = s[..split_at].trim();
        let value = s[split_at + operator.len()..].trim();
        let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);

        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let matcher = match operator {
            "=" => Self::equal(name, value),
            "!=" => Self::equal(name, value).negated(),
            "=~" => Self::regex(name, value),
            _ => Self::regex(name, value).negated(),
        };
        Ok(matcher)
    }
}

/// A silence as reported by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    #[serde(default)]
    pub id: String,
    /// Cluster the silence lives in; filled from the listing entry.
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub matchers: Vec<Matcher>,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub comment: String,
}

impl Silence {
    /// Length of the silence window, or `None` if either timestamp does not parse
    /// or the window ends before it starts.
    #[must_use]
    pub fn span(&self) -> Option<Duration> {
        let starts = DateTime::parse_from_rfc3339(&self.starts_at).ok()?;
        let ends = DateTime::parse_from_rfc3339(&self.ends_at).ok()?;
        (ends - starts).to_std().ok()
    }
}

/// Caller input for creating a silence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilenceRequest {
    pub matchers: Vec<Matcher>,
    /// Span such as `2h` or `1h30m`.
    pub duration: String,
    #[serde(default)]
    pub comment: String,
    /// Defaults to the configured author.
    #[serde(default)]
    pub created_by: Option<String>,
    /// Target cluster; defaults to the value of a `cluster="..."` matcher.
    #[serde(default)]
    pub cluster: Option<String>,
}

impl SilenceRequest {
    #[must_use]
    pub fn new(matchers: Vec<Matcher>, duration: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            matchers,
            duration: duration.into(),
            comment: comment.into(),
            created_by: None,
            cluster: None,
        }
    }

    #[must_use]
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    #[must_use]
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// The explicit cluster, or the value of a plain `cluster` matcher.
    #[must_use]
    pub fn target_cluster(&self) -> Option<&str> {
        self.cluster.as_deref().map(str::trim).filter(|c| !c.is_empty()).or_else(|| {
            self.matchers
                .iter()
                .find(|m| m.name == "cluster" && m.is_plain_equality() && !m.value.is_empty())
                .map(|m| m.value.as_str())
        })
    }
}

/// Body of the alertmanager v2 silence creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SilencePayload {
    pub matchers: Vec<Matcher>,
    pub starts_at: String,
    pub ends_at: String,
    pub created_by: String,
    pub comment: String,
}

/// Result of a successful silence creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSilence {
    pub id: String,
    pub cluster: String,
    /// Alertmanager instance the silence was sent to.
    pub instance: String,
    pub starts_at: String,
    pub ends_at: String,
}
