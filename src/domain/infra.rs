use serde::{Deserialize, Serialize};

/// Deployment target, passed through a chain unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetInfra {
    Kubernetes {
        cluster_ref: String,
        namespace: String,
        release_name: String,
    },
    Serverless {
        region: String,
        stage: String,
        connector_ref: String,
    },
}

impl TargetInfra {
    pub fn type_name(&self) -> &'static str {
        match self {
            TargetInfra::Kubernetes { .. } => "Kubernetes",
            TargetInfra::Serverless { .. } => "ServerlessAwsLambda",
        }
    }

    pub fn release_name(&self) -> Option<&str> {
        match self {
            TargetInfra::Kubernetes { release_name, .. } => Some(release_name),
            TargetInfra::Serverless { .. } => None,
        }
    }
}
