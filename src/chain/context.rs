//! Typed context carried between chain stages

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::release::ReleaseVersionRecord;
use super::response::FetchedFile;
use crate::domain::{DeployOutcome, ManifestOutcome, TargetInfra, UnitProgress};
use crate::source::FetchInstruction;

/// The deployable manifest together with its resolved fetch instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestHandle {
    pub manifest: ManifestOutcome,
    pub instruction: FetchInstruction,
}

impl ManifestHandle {
    pub fn identifier(&self) -> &str {
        &self.manifest.identifier
    }
}

/// Which fetch is outstanding while values are being gathered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStage {
    /// Git fetch of manifest files and git overlays
    Source,
    /// Chart repository fetch of the chart's own values
    Values,
}

/// State while one or more fetches are still outstanding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwaitingValues {
    pub manifest: ManifestHandle,
    pub target_infra: TargetInfra,
    pub stage: FetchStage,
    /// Identifiers requested by the outstanding fetch
    pub requested_refs: Vec<String>,
    /// Remote overlays not yet appended, in declaration order
    pub pending_overlay_refs: Vec<String>,
    /// Overlay contents in merge order; inline overlays come first
    pub accumulated_content: Vec<String>,
    /// Overlays fetched ahead of an earlier pending one
    #[serde(default)]
    pub fetched_overlays: BTreeMap<String, Vec<String>>,
    /// Files fetched for the deployable manifest itself
    #[serde(default)]
    pub manifest_files: Vec<FetchedFile>,
    /// A chart values fetch still follows the outstanding one
    pub values_fetch_pending: bool,
    #[serde(default)]
    pub rollback_target: Option<DeployOutcome>,
    #[serde(default)]
    pub last_unit_progress: Vec<UnitProgress>,
}

impl AwaitingValues {
    /// Records the files of a completed fetch.
    ///
    /// Overlay contents are appended in declaration order; an overlay that
    /// arrives before an earlier one is held back until the gap is filled.
    pub(crate) fn absorb(&mut self, files: &BTreeMap<String, Vec<FetchedFile>>) {
        let manifest_id = self.manifest.identifier().to_string();

        for id in std::mem::take(&mut self.requested_refs) {
            let fetched = files.get(&id);
            if fetched.is_none() {
                tracing::warn!(identifier = %id, "No files returned for requested manifest");
            }
            let fetched = fetched.cloned().unwrap_or_default();

            if id == manifest_id {
                self.manifest_files.extend(fetched);
            } else {
                let contents = fetched.into_iter().map(|file| file.content).collect();
                self.fetched_overlays.insert(id, contents);
            }
        }

        while let Some(next) = self.pending_overlay_refs.first() {
            let Some(contents) = self.fetched_overlays.remove(next) else {
                break;
            };
            self.accumulated_content.extend(contents);
            self.pending_overlay_refs.remove(0);
        }
    }
}

/// Normal in-flight state once the deploy or rollback has been dispatched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutingState {
    pub target_infra: TargetInfra,
    pub manifest: ManifestHandle,
    #[serde(default)]
    pub last_unit_progress: Vec<UnitProgress>,
    /// Set once the execution succeeded
    #[serde(default)]
    pub versions: Option<ReleaseVersionRecord>,
    /// Deploy outcome being rolled back, for rollback chains
    #[serde(default)]
    pub rollback_target: Option<DeployOutcome>,
    #[serde(default)]
    pub prepare_rollback_data: Option<String>,
    #[serde(default)]
    pub first_deployment: bool,
}

/// Serverless deploy waiting for its rollback data capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparingRollback {
    pub target_infra: TargetInfra,
    pub manifest: ManifestHandle,
    pub manifest_files: Vec<FetchedFile>,
    #[serde(default)]
    pub last_unit_progress: Vec<UnitProgress>,
}

/// Message and unit progress of a terminal failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub message: String,
    pub unit_progress: Vec<UnitProgress>,
}

impl FailureInfo {
    pub fn new(message: impl Into<String>, unit_progress: Vec<UnitProgress>) -> Self {
        Self {
            message: message.into(),
            unit_progress,
        }
    }
}

/// Pass-through context between chain stages.
///
/// Failure variants and `Skipped` are terminal: once reached, the chain
/// never leaves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChainContext {
    Executing(ExecutingState),
    AwaitingValues(AwaitingValues),
    PreparingRollback(PreparingRollback),
    SourceFetchFailed(FailureInfo),
    ValuesFetchFailed(FailureInfo),
    StepException(FailureInfo),
    Skipped { message: String },
}

impl ChainContext {
    pub fn state_name(&self) -> &'static str {
        match self {
            ChainContext::Executing(_) => "Executing",
            ChainContext::AwaitingValues(state) => match state.stage {
                FetchStage::Source => "AwaitingSourceFetch",
                FetchStage::Values => "AwaitingValuesFetch",
            },
            ChainContext::PreparingRollback(_) => "PreparingRollback",
            ChainContext::SourceFetchFailed(_) => "SourceFetchFailed",
            ChainContext::ValuesFetchFailed(_) => "ValuesFetchFailed",
            ChainContext::StepException(_) => "StepException",
            ChainContext::Skipped { .. } => "Skipped",
        }
    }

    pub fn failure(&self) -> Option<&FailureInfo> {
        match self {
            ChainContext::SourceFetchFailed(info)
            | ChainContext::ValuesFetchFailed(info)
            | ChainContext::StepException(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure().is_some()
    }

    /// Failure or skip; no response can move the chain out of these
    pub fn is_settled(&self) -> bool {
        self.is_failure() || matches!(self, ChainContext::Skipped { .. })
    }

    /// Unit progress last reported for this chain
    pub fn unit_progress(&self) -> &[UnitProgress] {
        match self {
            ChainContext::Executing(state) => &state.last_unit_progress,
            ChainContext::AwaitingValues(state) => &state.last_unit_progress,
            ChainContext::PreparingRollback(state) => &state.last_unit_progress,
            ChainContext::SourceFetchFailed(info)
            | ChainContext::ValuesFetchFailed(info)
            | ChainContext::StepException(info) => &info.unit_progress,
            ChainContext::Skipped { .. } => &[],
        }
    }
}
