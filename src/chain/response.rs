//! Agent responses fed back into the chain

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ReleaseInfo, UnitProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
}

/// Result of a git fetch or a chart values fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub unit_progress: Vec<UnitProgress>,
    /// Files keyed by the identifier of the fetch config that requested them
    #[serde(default)]
    pub files: BTreeMap<String, Vec<FetchedFile>>,
    #[serde(default)]
    pub fetched_commit_ids: BTreeMap<String, String>,
}

impl FetchResponse {
    pub fn success() -> Self {
        Self {
            status: CommandStatus::Success,
            error_message: None,
            unit_progress: Vec::new(),
            files: BTreeMap::new(),
            fetched_commit_ids: BTreeMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>, unit_progress: Vec<UnitProgress>) -> Self {
        Self {
            status: CommandStatus::Failure,
            error_message: Some(message.into()),
            unit_progress,
            ..Self::success()
        }
    }

    pub fn with_file(
        mut self,
        identifier: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.files
            .entry(identifier.into())
            .or_default()
            .push(FetchedFile {
                path: path.into(),
                content: content.into(),
            });
        self
    }

    pub fn with_unit_progress(mut self, unit_progress: Vec<UnitProgress>) -> Self {
        self.unit_progress = unit_progress;
        self
    }
}

/// Result of capturing rollback state before a serverless deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPrepResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub unit_progress: Vec<UnitProgress>,
    /// Opaque marker of the currently deployed version
    #[serde(default)]
    pub rollback_data: Option<String>,
    #[serde(default)]
    pub first_deployment: bool,
}

/// Result of a deploy or rollback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub status: CommandStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub unit_progress: Vec<UnitProgress>,
    #[serde(default)]
    pub release_name: Option<String>,
    /// Release history as it was before this execution, oldest first
    #[serde(default)]
    pub release_history: Vec<ReleaseInfo>,
    #[serde(default)]
    pub deployed_resources: Vec<String>,
}

impl ExecuteResponse {
    pub fn success() -> Self {
        Self {
            status: CommandStatus::Success,
            error_message: None,
            unit_progress: Vec::new(),
            release_name: None,
            release_history: Vec::new(),
            deployed_resources: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>, unit_progress: Vec<UnitProgress>) -> Self {
        Self {
            status: CommandStatus::Failure,
            error_message: Some(message.into()),
            unit_progress,
            ..Self::success()
        }
    }

    pub fn with_history<I, S>(mut self, revisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.release_history = revisions.into_iter().map(ReleaseInfo::new).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The agent could not be reached
    Transport,
    /// The agent ran the task and raised an error
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub kind: ErrorKind,
}

/// Every response shape the agent can deliver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentResponse {
    SourceFetch(FetchResponse),
    ValuesFetch(FetchResponse),
    RollbackPrep(RollbackPrepResponse),
    Execute(ExecuteResponse),
    Error(ErrorResponse),
}

impl AgentResponse {
    pub fn shape_name(&self) -> &'static str {
        match self {
            AgentResponse::SourceFetch(_) => "SourceFetchResult",
            AgentResponse::ValuesFetch(_) => "ValuesFetchResult",
            AgentResponse::RollbackPrep(_) => "RollbackPrepResult",
            AgentResponse::Execute(_) => "ExecuteResult",
            AgentResponse::Error(_) => "ErrorResult",
        }
    }

    pub fn unit_progress(&self) -> &[UnitProgress] {
        match self {
            AgentResponse::SourceFetch(r) | AgentResponse::ValuesFetch(r) => &r.unit_progress,
            AgentResponse::RollbackPrep(r) => &r.unit_progress,
            AgentResponse::Execute(r) => &r.unit_progress,
            AgentResponse::Error(_) => &[],
        }
    }

    pub fn remote_error(message: impl Into<String>) -> Self {
        AgentResponse::Error(ErrorResponse {
            message: message.into(),
            kind: ErrorKind::Remote,
        })
    }
}
