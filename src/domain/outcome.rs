use serde::{Deserialize, Serialize};

/// One entry of a release's history as reported by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub revision: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub chart: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ReleaseInfo {
    pub fn new(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            status: "deployed".to_string(),
            chart: None,
            description: None,
        }
    }
}

/// Outcome persisted by a successful deploy and read back by its rollback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployOutcome {
    pub release_name: String,
    pub previous_release_version: u32,
    pub new_release_version: u32,
    #[serde(default)]
    pub deployed_resources: Vec<String>,
    /// Opaque state captured before a serverless deploy
    #[serde(default)]
    pub prepare_rollback_data: Option<String>,
    #[serde(default)]
    pub first_deployment: bool,
}
