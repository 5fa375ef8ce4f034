//! Deployment technologies driven by the chain

use serde::{Deserialize, Serialize};

use super::OperationKind;
use crate::config::StepSpec;
use crate::domain::{ManifestType, TargetInfra};

/// Technology strategy, chosen once when a controller is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    NativeHelm,
    Serverless,
}

impl Technology {
    pub fn display_name(&self) -> &'static str {
        match self {
            Technology::NativeHelm => "Helm",
            Technology::Serverless => "Serverless",
        }
    }

    /// Manifest type the technology deploys
    pub fn deployable_manifest(&self) -> ManifestType {
        match self {
            Technology::NativeHelm => ManifestType::HelmChart,
            Technology::Serverless => ManifestType::ServerlessAwsLambda,
        }
    }

    /// Whether values overlays are merged into the deployment
    pub fn uses_values_overlays(&self) -> bool {
        matches!(self, Technology::NativeHelm)
    }

    /// Name under which a deploy outcome is recorded
    pub fn outcome_name(&self) -> &'static str {
        match self {
            Technology::NativeHelm => "HELM_DEPLOY_OUTCOME",
            Technology::Serverless => "SERVERLESS_DEPLOY_OUTCOME",
        }
    }

    pub fn supports(&self, spec: &StepSpec) -> bool {
        match self {
            Technology::NativeHelm => matches!(
                spec,
                StepSpec::HelmDeploy { .. } | StepSpec::HelmRollback { .. }
            ),
            Technology::Serverless => matches!(
                spec,
                StepSpec::ServerlessDeploy { .. } | StepSpec::ServerlessRollback { .. }
            ),
        }
    }

    pub fn supports_infra(&self, infra: &TargetInfra) -> bool {
        matches!(
            (self, infra),
            (Technology::NativeHelm, TargetInfra::Kubernetes { .. })
                | (Technology::Serverless, TargetInfra::Serverless { .. })
        )
    }

    /// Deploy steps of this technology capture rollback data first
    pub fn prepares_rollback(&self) -> bool {
        matches!(self, Technology::Serverless)
    }

    pub fn execute_operation(&self, rollback: bool) -> OperationKind {
        match (self, rollback) {
            (Technology::NativeHelm, false) => OperationKind::HelmDeploy,
            (Technology::NativeHelm, true) => OperationKind::HelmRollback,
            (Technology::Serverless, false) => OperationKind::ServerlessDeploy,
            (Technology::Serverless, true) => OperationKind::ServerlessRollback,
        }
    }

    pub fn skip_rollback_message(&self) -> String {
        format!(
            "{} Deploy step was not executed. Skipping rollback.",
            self.display_name()
        )
    }
}

impl std::fmt::Display for Technology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
