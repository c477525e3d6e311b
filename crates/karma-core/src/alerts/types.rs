//! Alert type definitions.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Fallback for alerts without a name or cluster.
pub const UNKNOWN: &str = "unknown";

/// Severity level of an alert.
///
/// Declaration order is the display order used by summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Critical alert requiring immediate attention.
    Critical,
    /// Warning alert indicating potential issues.
    Warning,
    /// Informational alert for awareness.
    Info,
    /// Explicit `severity="none"`, e.g. the always-firing `Watchdog`.
    None,
    /// No severity label, or a value outside the known levels.
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 5] =
        [Self::Critical, Self::Warning, Self::Info, Self::None, Self::Unknown];

    /// Classifies a raw label value. Never fails: unrecognised values become `Unknown`.
    #[must_use]
    pub fn classify(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::Unknown)
    }

    /// Case-insensitive parse of one of the five level names.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            "none" => Some(Self::None),
            "unknown" => Some(Self::Unknown),
            _ => Option::None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            EngineError::InvalidFilter(format!(
                "unknown severity '{s}', expected one of: critical, warning, info, none, unknown"
            ))
        })
    }
}

/// Whether an alert is firing or silenced/inhibited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Active,
    Suppressed,
}

impl AlertState {
    pub const ALL: [AlertState; 2] = [Self::Active, Self::Suppressed];

    /// Anything other than an explicit suppression is treated as active.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "suppressed" | "inhibited" | "silenced" => Self::Suppressed,
            _ => Self::Active,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State restriction accepted by `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    All,
    Active,
    Suppressed,
}

impl StateFilter {
    #[must_use]
    pub fn matches(&self, state: AlertState) -> bool {
        match self {
            Self::All => true,
            Self::Active => state == AlertState::Active,
            Self::Suppressed => state == AlertState::Suppressed,
        }
    }
}

impl FromStr for StateFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "suppressed" => Ok(Self::Suppressed),
            _ => Err(EngineError::InvalidFilter(format!(
                "unknown state '{s}', expected one of: active, suppressed, all"
            ))),
        }
    }
}

/// Name matching mode for `search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Substring,
    Exact,
}

impl FromStr for SearchMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" | "contains" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            _ => Err(EngineError::InvalidFilter(format!(
                "unknown search mode '{s}', expected one of: substring, exact"
            ))),
        }
    }
}

/// A normalized alert.
///
/// Built fresh on every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// `alertname` label, or [`UNKNOWN`]. Never empty.
    pub name: String,
    /// `cluster` label, the collecting alertmanager's cluster, or [`UNKNOWN`].
    pub cluster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub severity: Severity,
    pub state: AlertState,
    /// Group labels overlaid with alert labels.
    pub labels: BTreeMap<String, String>,
    /// Shared annotations overlaid with alert annotations.
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Names of the alertmanager instances reporting this alert.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alertmanagers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl Alert {
    /// Defined-or-absent label lookup.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.annotations.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == AlertState::Active
    }
}
