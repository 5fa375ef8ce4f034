//! Step configuration as authored in the pipeline

use serde::{Deserialize, Serialize};

/// Command unit names reported by the agent
pub mod units {
    pub const FETCH_FILES: &str = "Fetch Files";
    pub const INIT: &str = "Init";
    pub const PREPARE: &str = "Prepare";
    pub const INSTALL_UPGRADE: &str = "Install / Upgrade";
    pub const ROLLBACK: &str = "Rollback";
    pub const WAIT_FOR_STEADY_STATE: &str = "Wait For Steady State";
    pub const WRAP_UP: &str = "Wrap Up";
    pub const SETUP_DIRECTORY: &str = "Setup Directory";
    pub const ARTIFACT: &str = "Artifact";
    pub const PREPARE_ROLLBACK_DATA: &str = "Prepare Rollback Data";
    pub const DEPLOY: &str = "Deploy";
}

const HELM_DEPLOY_UNITS: &[&str] = &[
    units::FETCH_FILES,
    units::INIT,
    units::PREPARE,
    units::INSTALL_UPGRADE,
    units::WAIT_FOR_STEADY_STATE,
    units::WRAP_UP,
];

const HELM_ROLLBACK_UNITS: &[&str] = &[
    units::FETCH_FILES,
    units::INIT,
    units::ROLLBACK,
    units::WAIT_FOR_STEADY_STATE,
    units::WRAP_UP,
];

const SERVERLESS_DEPLOY_UNITS: &[&str] = &[
    units::FETCH_FILES,
    units::SETUP_DIRECTORY,
    units::ARTIFACT,
    units::PREPARE_ROLLBACK_DATA,
    units::DEPLOY,
];

const SERVERLESS_ROLLBACK_UNITS: &[&str] = &[
    units::FETCH_FILES,
    units::SETUP_DIRECTORY,
    units::ARTIFACT,
    units::ROLLBACK,
];

/// Step-type specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    HelmDeploy {
        #[serde(default)]
        skip_dry_run: bool,
        #[serde(default)]
        ignore_release_hist_failed_status: bool,
        #[serde(default)]
        skip_steady_state_check: bool,
    },
    HelmRollback {
        /// Identifier of the deploy step whose outcome is rolled back
        #[serde(default)]
        deploy_step_ref: Option<String>,
        #[serde(default)]
        skip_dry_run: bool,
    },
    ServerlessDeploy {
        #[serde(default)]
        command_options: Option<String>,
    },
    ServerlessRollback {
        #[serde(default)]
        deploy_step_ref: Option<String>,
    },
}

impl StepSpec {
    pub fn display_name(&self) -> &'static str {
        match self {
            StepSpec::HelmDeploy { .. } => "Helm Deploy",
            StepSpec::HelmRollback { .. } => "Helm Rollback",
            StepSpec::ServerlessDeploy { .. } => "Serverless Deploy",
            StepSpec::ServerlessRollback { .. } => "Serverless Rollback",
        }
    }

    /// Command units the agent reports for this step, in display order
    pub fn command_units(&self) -> &'static [&'static str] {
        match self {
            StepSpec::HelmDeploy { .. } => HELM_DEPLOY_UNITS,
            StepSpec::HelmRollback { .. } => HELM_ROLLBACK_UNITS,
            StepSpec::ServerlessDeploy { .. } => SERVERLESS_DEPLOY_UNITS,
            StepSpec::ServerlessRollback { .. } => SERVERLESS_ROLLBACK_UNITS,
        }
    }

    pub fn is_rollback(&self) -> bool {
        matches!(
            self,
            StepSpec::HelmRollback { .. } | StepSpec::ServerlessRollback { .. }
        )
    }

    /// Deploy step reference for rollback steps, blank values treated as unset
    pub fn deploy_step_ref(&self) -> Option<&str> {
        match self {
            StepSpec::HelmRollback { deploy_step_ref, .. }
            | StepSpec::ServerlessRollback { deploy_step_ref } => deploy_step_ref
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty()),
            _ => None,
        }
    }
}

/// A single step of a deployment stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub identifier: String,
    /// Timeout string such as `10m`; engine default when absent
    #[serde(default)]
    pub timeout: Option<String>,
    /// Selectors restricting which agents may run the step's tasks
    #[serde(default)]
    pub delegate_selectors: Vec<String>,
    pub spec: StepSpec,
}

impl StepConfig {
    pub fn new(identifier: impl Into<String>, spec: StepSpec) -> Self {
        Self {
            identifier: identifier.into(),
            timeout: None,
            delegate_selectors: Vec::new(),
            spec,
        }
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn with_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delegate_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a step definition from YAML
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn helm_deploy(identifier: impl Into<String>) -> Self {
        Self::new(
            identifier,
            StepSpec::HelmDeploy {
                skip_dry_run: false,
                ignore_release_hist_failed_status: false,
                skip_steady_state_check: false,
            },
        )
    }

    pub fn helm_rollback(identifier: impl Into<String>, deploy_step_ref: impl Into<String>) -> Self {
        Self::new(
            identifier,
            StepSpec::HelmRollback {
                deploy_step_ref: Some(deploy_step_ref.into()),
                skip_dry_run: false,
            },
        )
    }

    pub fn serverless_deploy(identifier: impl Into<String>) -> Self {
        Self::new(
            identifier,
            StepSpec::ServerlessDeploy {
                command_options: None,
            },
        )
    }

    pub fn serverless_rollback(
        identifier: impl Into<String>,
        deploy_step_ref: impl Into<String>,
    ) -> Self {
        Self::new(
            identifier,
            StepSpec::ServerlessRollback {
                deploy_step_ref: Some(deploy_step_ref.into()),
            },
        )
    }
}
