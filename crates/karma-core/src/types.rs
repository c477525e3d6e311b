//! Wire types for the Karma dashboard API.
//!
//! Karma nests alerts as `grids[].alertGroups[].alerts[]` and encodes labels as
//! `[{"name": .., "value": ..}]` lists. Everything here is decoded leniently:
//! unknown fields are ignored, and groups/alerts stay as raw [`Value`]s until
//! the normalizer decodes each one on its own so a single bad record cannot
//! abort the batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body for `POST /alerts.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertsQuery {
    /// Karma filter expressions, e.g. `@state=active` or `cluster=prod`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

impl AlertsQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// One `name`/`value` entry of a Karma label or annotation list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPair {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A label or annotation collection.
///
/// Karma emits name/value lists; plain JSON maps are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawPairs {
    List(Vec<RawPair>),
    Map(BTreeMap<String, String>),
}

impl Default for RawPairs {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl RawPairs {
    /// Iterates the pairs in upstream order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        match self {
            Self::List(pairs) => Box::new(pairs.iter().map(|p| (p.name.as_str(), p.value.as_str()))),
            Self::Map(map) => Box::new(map.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        }
    }

    /// Defined-or-absent lookup; the last occurrence wins on duplicate names.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().filter(|(k, _)| *k == name).map(|(_, v)| v).last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(pairs) => pairs.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }
}

/// Top-level `alerts.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub grids: Vec<Value>,

    /// Flat group list, accepted for dashboards that do not grid their output.
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Value>,

    #[serde(default, deserialize_with = "lenient")]
    pub upstreams: RawUpstreams,
}

impl AlertsDocument {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the body is not a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Decodes the alertmanager instance list, skipping entries without a name.
    #[must_use]
    pub fn instances(&self) -> Vec<UpstreamInstance> {
        self.upstreams
            .instances
            .iter()
            .filter_map(|raw| serde_json::from_value(raw.clone()).ok())
            .collect()
    }
}

/// A grid: Karma's first level of grouping.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrid {
    #[serde(default, deserialize_with = "null_as_default")]
    pub alert_groups: Vec<Value>,
}

/// Labels and annotations Karma hoists out of every alert in a group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShared {
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: RawPairs,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: RawPairs,
}

/// An alert group. `alerts` is required; a group without it is dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAlertGroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: RawPairs,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shared: RawShared,
    pub alerts: Vec<Value>,
}

/// Reference to the alertmanager instance(s) an alert was collected from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlertmanagerRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster: String,
}

/// A single alert inside a group. `state` is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAlert {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: RawPairs,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: RawPairs,
    pub state: String,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alertmanager: Vec<RawAlertmanagerRef>,
}

/// One entry of the `GET /silences.json` listing.
///
/// The silence body stays raw so a malformed entry can be skipped on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSilenceEntry {
    #[serde(default)]
    pub cluster: String,
    pub silence: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUpstreams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: Vec<Value>,
}

/// An alertmanager instance the dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamInstance {
    pub name: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default, rename = "publicURI", alias = "uri")]
    pub uri: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub error: Option<String>,
}

impl UpstreamInstance {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Decodes a field, falling back to its default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Reads an explicit `null` as the field's default; any other shape must still decode.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
