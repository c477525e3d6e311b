//! Request bodies shared by the REST routes and the tool endpoint.

use karma_core::{
    silences::{Matcher, SilenceRequest},
    EngineError,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct StateParams {
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub pattern: String,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsBody {
    #[serde(alias = "alertName", alias = "alert_name")]
    pub name: String,
    #[serde(default, alias = "multi_cluster")]
    pub multi_cluster: bool,
    #[serde(default, alias = "cluster_filter")]
    pub cluster_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerBody {
    pub container: String,
    #[serde(default, alias = "cluster_filter")]
    pub cluster_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveSilenceParams {
    #[serde(alias = "silenceId", alias = "silence_id")]
    pub id: String,
    pub cluster: Option<String>,
}

/// A matcher given either as text (`alertname=Foo`, `env!~dev.*`) or as an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MatcherInput {
    Text(String),
    Structured(Matcher),
}

impl MatcherInput {
    fn into_matchers(self) -> Result<Vec<Matcher>, EngineError> {
        match self {
            Self::Text(raw) => Matcher::parse_list(&raw),
            Self::Structured(matcher) => Ok(vec![matcher]),
        }
    }
}

/// One matcher input or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MatcherList {
    Many(Vec<MatcherInput>),
    One(MatcherInput),
}

impl Default for MatcherList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl MatcherList {
    fn into_matchers(self) -> Result<Vec<Matcher>, EngineError> {
        match self {
            Self::One(input) => input.into_matchers(),
            Self::Many(inputs) => {
                let mut matchers = Vec::with_capacity(inputs.len());
                for input in inputs {
                    matchers.extend(input.into_matchers()?);
                }
                Ok(matchers)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSilenceBody {
    #[serde(default)]
    pub matchers: MatcherList,
    /// Empty takes the configured default.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, alias = "created_by")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
}

impl CreateSilenceBody {
    /// # Errors
    ///
    /// [`EngineError::InvalidSilenceRequest`] for an unparsable text matcher.
    pub fn into_request(self) -> Result<SilenceRequest, EngineError> {
        let matchers = self.matchers.into_matchers()?;
        let mut request = SilenceRequest::new(matchers, self.duration, self.comment);
        if let Some(cluster) = self.cluster {
            request = request.with_cluster(cluster);
        }
        if let Some(created_by) = self.created_by {
            request = request.with_created_by(created_by);
        }
        Ok(request)
    }
}
