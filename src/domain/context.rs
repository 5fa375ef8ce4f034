use serde::{Deserialize, Serialize};

use super::{ManifestOutcome, TargetInfra};

/// Identity and resolved inputs of the step being executed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub account_id: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub plan_execution_id: String,
    /// Stable key of the current stage, used to find outcomes of earlier steps
    pub stage_key: String,
    #[serde(default)]
    pub manifests: Vec<ManifestOutcome>,
    #[serde(default)]
    pub infrastructure: Option<TargetInfra>,
}

impl ExecutionContext {
    pub fn new(
        account_id: impl Into<String>,
        plan_execution_id: impl Into<String>,
        stage_key: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            plan_execution_id: plan_execution_id.into(),
            stage_key: stage_key.into(),
            ..Default::default()
        }
    }

    pub fn with_manifest(mut self, manifest: ManifestOutcome) -> Self {
        self.manifests.push(manifest);
        self
    }

    pub fn with_infrastructure(mut self, infra: TargetInfra) -> Self {
        self.infrastructure = Some(infra);
        self
    }

    pub fn with_scope(mut self, org_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self.project_id = Some(project_id.into());
        self
    }
}
