//! Chain result types and data structures.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ChainContext;
use crate::domain::{DeployOutcome, UnitProgress};

/// Remote operation the agent is asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    GitFetch,
    HelmValuesFetch,
    HelmDeploy,
    HelmRollback,
    ServerlessPrepareRollback,
    ServerlessDeploy,
    ServerlessRollback,
}

impl OperationKind {
    /// Task type understood by the agent
    pub fn task_type(&self) -> &'static str {
        match self {
            OperationKind::GitFetch => "GIT_FETCH_NEXT_GEN_TASK",
            OperationKind::HelmValuesFetch => "HELM_VALUES_FETCH_NG",
            OperationKind::HelmDeploy | OperationKind::HelmRollback => "HELM_COMMAND_TASK_NG",
            OperationKind::ServerlessPrepareRollback
            | OperationKind::ServerlessDeploy
            | OperationKind::ServerlessRollback => "SERVERLESS_COMMAND_TASK",
        }
    }

    /// Human readable task name shown next to the task
    pub fn display_name(&self) -> &'static str {
        match self {
            OperationKind::GitFetch => "Git Fetch Files Task",
            OperationKind::HelmValuesFetch => "Helm Values Fetch Task",
            OperationKind::HelmDeploy => "Helm Deploy",
            OperationKind::HelmRollback => "Helm Rollback",
            OperationKind::ServerlessPrepareRollback => "Serverless Prepare Rollback",
            OperationKind::ServerlessDeploy => "Serverless Deploy",
            OperationKind::ServerlessRollback => "Serverless Rollback",
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, OperationKind::GitFetch | OperationKind::HelmValuesFetch)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A remote task ready to be handed to the agent dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCallRequest {
    pub operation: OperationKind,
    pub task_type: String,
    pub task_name: String,
    pub account_id: String,
    /// Serialized operation parameters
    pub params: serde_json::Value,
    pub timeout_millis: u64,
    /// Command units of the step, unmodified
    pub command_units: Vec<String>,
    /// Agent selectors; empty means any agent
    pub selectors: BTreeSet<String>,
    pub async_flag: bool,
}

/// What a single chain advance produced.
///
/// A result either carries the next remote call together with the context
/// to hand back on the following advance, or it is final and carries only
/// the terminal context. Construction goes through [`ChainStepResult::next`]
/// and [`ChainStepResult::terminal`], so a final result never has a call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStepResult {
    next_call: Option<RemoteCallRequest>,
    context: ChainContext,
}

impl ChainStepResult {
    pub fn next(call: RemoteCallRequest, context: ChainContext) -> Self {
        Self {
            next_call: Some(call),
            context,
        }
    }

    pub fn terminal(context: ChainContext) -> Self {
        Self {
            next_call: None,
            context,
        }
    }

    pub fn is_final(&self) -> bool {
        self.next_call.is_none()
    }

    pub fn next_call(&self) -> Option<&RemoteCallRequest> {
        self.next_call.as_ref()
    }

    pub fn context(&self) -> &ChainContext {
        &self.context
    }

    pub fn into_parts(self) -> (Option<RemoteCallRequest>, ChainContext) {
        (self.next_call, self.context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    Skipped,
}

impl OutcomeStatus {
    pub fn as_marker(&self) -> &'static str {
        match self {
            OutcomeStatus::Succeeded => "succeeded",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_marker())
    }
}

/// User-visible result of a finished step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub status: OutcomeStatus,
    /// Failure or skip reason
    pub message: Option<String>,
    pub unit_progress: Vec<UnitProgress>,
    /// Release record for successful deploys and rollbacks
    pub deploy_outcome: Option<DeployOutcome>,
}

impl StepOutcome {
    pub fn succeeded(outcome: DeployOutcome, unit_progress: Vec<UnitProgress>) -> Self {
        Self {
            status: OutcomeStatus::Succeeded,
            message: None,
            unit_progress,
            deploy_outcome: Some(outcome),
        }
    }

    pub fn failed(message: impl Into<String>, unit_progress: Vec<UnitProgress>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            message: Some(message.into()),
            unit_progress,
            deploy_outcome: None,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Skipped,
            message: Some(message.into()),
            unit_progress: Vec::new(),
            deploy_outcome: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}
