//! Chain control for multi-stage deployments.
//!
//! This module provides the [`ChainController`], the state machine shared by
//! every deployment technology:
//!
//! ```text
//! start -> fetch source -> [fetch values] -> [prepare rollback] -> execute -> finalize
//! ```
//!
//! The controller never waits on the agent. [`ChainController::advance`] is
//! called once to start a chain and once per delivered response, and returns
//! either the next [`RemoteCallRequest`] with the context to hand back, or a
//! terminal context. [`ChainController::finalize`] converts the terminal
//! context plus the last response into a [`StepOutcome`] and records the
//! deploy outcome a later rollback looks up.

mod classify;
mod context;
mod dispatch;
mod overlay;
mod params;
mod release;
mod response;
mod technology;
mod types;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, StepConfig, StepSpec};
use crate::domain::{
    DeployOutcome, ExecutionContext, ManifestOutcome, ManifestType, StoreConfig, TargetInfra,
    UnitProgress, complete_unit_progress,
};
use crate::error::{ChainError, Result};
use crate::source::{
    FetchInstruction, GitFetchConfig, SourceResolver, chart_values_file, normalize_paths,
};
use crate::store::{ConnectorProvider, OutcomeStore, outcome_key};

pub use context::{
    AwaitingValues, ChainContext, ExecutingState, FailureInfo, FetchStage, ManifestHandle,
    PreparingRollback,
};
pub use dispatch::TaskDispatcher;
pub use overlay::{OverlayPlan, plan_overlays, validate_values};
pub use params::{
    GitFetchParams, HelmDeployParams, HelmRollbackParams, HelmValuesFetchParams,
    ServerlessDeployParams, ServerlessPrepareRollbackParams, ServerlessRollbackParams,
    ServerlessTarget,
};
pub use release::{ReleaseVersionRecord, compute_deploy_version, compute_rollback_version};
pub use response::{
    AgentResponse, CommandStatus, ErrorKind, ErrorResponse, ExecuteResponse, FetchResponse,
    FetchedFile, RollbackPrepResponse,
};
pub use technology::Technology;
pub use types::{ChainStepResult, OperationKind, OutcomeStatus, RemoteCallRequest, StepOutcome};

static RELEASE_NAME_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").ok()
});

/// Checks a Kubernetes release name against the DNS subdomain format
pub fn validate_release_name(name: &str) -> Result<()> {
    let valid = RELEASE_NAME_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name));
    if valid {
        Ok(())
    } else {
        Err(ChainError::config(format!(
            "Invalid Release name format: [{}]. Release name must consist of lower case \
             alphanumeric characters, '-' or '.', and must start and end with an \
             alphanumeric character",
            name
        )))
    }
}

/// Inputs of the final deploy or rollback call
struct ExecuteInputs {
    manifest: ManifestHandle,
    target_infra: TargetInfra,
    manifest_files: Vec<FetchedFile>,
    overlays: Vec<String>,
    rollback_target: Option<DeployOutcome>,
    prepare_rollback_data: Option<String>,
    first_deployment: bool,
    last_unit_progress: Vec<UnitProgress>,
}

/// Drives one technology's deploy and rollback chains.
///
/// The controller holds only shared, read-only collaborators, so one
/// instance can serve any number of independent chains concurrently.
pub struct ChainController<'a> {
    technology: Technology,
    config: &'a EngineConfig,
    connectors: &'a dyn ConnectorProvider,
    outcomes: &'a dyn OutcomeStore,
}

impl<'a> ChainController<'a> {
    pub fn new(
        technology: Technology,
        config: &'a EngineConfig,
        connectors: &'a dyn ConnectorProvider,
        outcomes: &'a dyn OutcomeStore,
    ) -> Self {
        Self {
            technology,
            config,
            connectors,
            outcomes,
        }
    }

    pub fn technology(&self) -> Technology {
        self.technology
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    fn dispatcher(&self) -> TaskDispatcher<'a> {
        TaskDispatcher::new(self.config)
    }

    fn resolver(&self) -> SourceResolver<'a> {
        SourceResolver::new(&self.config.features)
    }

    /// Starts the chain (`prior` absent) or continues it with the agent's
    /// response to the previously returned call.
    ///
    /// Configuration errors found while starting are returned as `Err` before
    /// any call is issued. Once running, failures end the chain in a failure
    /// context instead; only infrastructure faults are returned as `Err`.
    pub fn advance(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        prior: Option<&ChainContext>,
        response: Option<&AgentResponse>,
    ) -> Result<ChainStepResult> {
        match (prior, response) {
            (None, _) => self.start(ctx, step),
            (Some(context), Some(response)) => self.classify(ctx, step, context, response),
            (Some(context), None) if context.is_settled() => {
                Ok(ChainStepResult::terminal(context.clone()))
            }
            (Some(context), None) => Ok(self.step_exception(
                format!(
                    "No response delivered for chain state {}",
                    context.state_name()
                ),
                context.unit_progress(),
            )),
        }
    }

    /// Converts the terminal context and last response into the step outcome.
    ///
    /// Successful deploys record their [`DeployOutcome`] under the stage key
    /// so a later rollback step can find it.
    pub fn finalize(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        context: &ChainContext,
        response: Option<&AgentResponse>,
    ) -> StepOutcome {
        match context {
            ChainContext::SourceFetchFailed(info)
            | ChainContext::ValuesFetchFailed(info)
            | ChainContext::StepException(info) => {
                StepOutcome::failed(info.message.clone(), info.unit_progress.clone())
            }
            ChainContext::Skipped { message } => StepOutcome::skipped(message.clone()),
            ChainContext::AwaitingValues(_) | ChainContext::PreparingRollback(_) => {
                StepOutcome::failed(
                    format!(
                        "Chain finalized before completion in state {}",
                        context.state_name()
                    ),
                    complete_unit_progress(context.unit_progress(), Utc::now()),
                )
            }
            ChainContext::Executing(state) => self.finalize_execution(ctx, step, state, response),
        }
    }

    fn finalize_execution(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        state: &ExecutingState,
        response: Option<&AgentResponse>,
    ) -> StepOutcome {
        let Some(AgentResponse::Execute(execution)) = response else {
            let shape = response.map(AgentResponse::shape_name).unwrap_or("none");
            return StepOutcome::failed(
                format!("Unexpected response {} for a finished execution", shape),
                complete_unit_progress(&state.last_unit_progress, Utc::now()),
            );
        };

        if execution.status != CommandStatus::Success {
            let message = execution.error_message.clone().unwrap_or_else(|| {
                format!("{} step failed", step.spec.display_name())
            });
            return StepOutcome::failed(message, execution.unit_progress.clone());
        }

        let Some(versions) = state.versions else {
            return StepOutcome::failed(
                "Release versions were not recorded for a successful execution",
                execution.unit_progress.clone(),
            );
        };

        let release_name = execution
            .release_name
            .clone()
            .or_else(|| state.target_infra.release_name().map(str::to_string))
            .or_else(|| state.rollback_target.as_ref().map(|prior| prior.release_name.clone()))
            .unwrap_or_else(|| state.manifest.identifier().to_string());

        let outcome = DeployOutcome {
            release_name,
            previous_release_version: versions.previous_version,
            new_release_version: versions.new_version,
            deployed_resources: execution.deployed_resources.clone(),
            prepare_rollback_data: state.prepare_rollback_data.clone(),
            first_deployment: state.first_deployment,
        };

        if !step.spec.is_rollback() {
            let key = outcome_key(&ctx.stage_key, &step.identifier, self.technology.outcome_name());
            self.outcomes.save(&key, outcome.clone());
            info!(key = %key, "Recorded deploy outcome");
        }

        StepOutcome::succeeded(outcome, execution.unit_progress.clone())
    }

    fn start(&self, ctx: &ExecutionContext, step: &StepConfig) -> Result<ChainStepResult> {
        if !self.technology.supports(&step.spec) {
            return Err(ChainError::config(format!(
                "{} step is not supported by the {} chain",
                step.spec.display_name(),
                self.technology
            )));
        }

        if step.spec.is_rollback() {
            return self.start_rollback(ctx, step);
        }

        let target_infra = self.target_infra(ctx, step)?;
        let handle = self.resolve_manifest(ctx, step)?;
        info!(
            step = %step.identifier,
            manifest = handle.identifier(),
            technology = %self.technology,
            "Starting deploy chain"
        );

        match self.technology {
            Technology::NativeHelm => self.start_helm_deploy(ctx, step, handle, target_infra),
            Technology::Serverless => self.start_source_fetch(ctx, step, handle, target_infra, None),
        }
    }

    fn start_rollback(&self, ctx: &ExecutionContext, step: &StepConfig) -> Result<ChainStepResult> {
        let skipped = || {
            ChainStepResult::terminal(ChainContext::Skipped {
                message: self.technology.skip_rollback_message(),
            })
        };

        let Some(deploy_step_ref) = step.spec.deploy_step_ref() else {
            info!(step = %step.identifier, "No deploy step reference, skipping rollback");
            return Ok(skipped());
        };

        let key = outcome_key(&ctx.stage_key, deploy_step_ref, self.technology.outcome_name());
        let Some(prior) = self.outcomes.load(&key) else {
            info!(key = %key, "No deploy outcome recorded, skipping rollback");
            return Ok(skipped());
        };

        let target_infra = self.target_infra(ctx, step)?;
        let handle = self.resolve_manifest(ctx, step)?;
        info!(
            step = %step.identifier,
            release = %prior.release_name,
            rollback_version = prior.previous_release_version,
            "Starting rollback chain"
        );
        self.start_source_fetch(ctx, step, handle, target_infra, Some(prior))
    }

    fn target_infra(&self, ctx: &ExecutionContext, step: &StepConfig) -> Result<TargetInfra> {
        let infra = ctx.infrastructure.clone().ok_or_else(|| {
            ChainError::config(format!(
                "Infrastructure is mandatory for {} step",
                step.spec.display_name()
            ))
        })?;

        if !self.technology.supports_infra(&infra) {
            return Err(ChainError::config(format!(
                "Infrastructure type {} is not supported for {} step",
                infra.type_name(),
                step.spec.display_name()
            )));
        }
        if let Some(release_name) = infra.release_name() {
            validate_release_name(release_name)?;
        }
        Ok(infra)
    }

    /// Picks the single deployable manifest of the technology
    fn select_manifest<'c>(
        &self,
        ctx: &'c ExecutionContext,
        step: &StepConfig,
    ) -> Result<&'c ManifestOutcome> {
        let wanted = self.technology.deployable_manifest();
        let candidates: Vec<&ManifestOutcome> = ctx
            .manifests
            .iter()
            .filter(|m| m.manifest_type == wanted)
            .collect();

        match candidates.as_slice() {
            [] => Err(ChainError::config(format!(
                "Manifests are mandatory for {} step. Select one from {}",
                step.spec.display_name(),
                wanted
            ))),
            [manifest] => Ok(manifest),
            _ => Err(ChainError::config(format!(
                "There can be only a single manifest. Select one from {}",
                wanted
            ))),
        }
    }

    fn resolve_manifest(&self, ctx: &ExecutionContext, step: &StepConfig) -> Result<ManifestHandle> {
        let manifest = self.select_manifest(ctx, step)?;
        let connector_ref = manifest.store.connector_ref().ok_or_else(|| {
            ChainError::config(format!(
                "Unsupported Store Config type: [{}]",
                manifest.store.type_name()
            ))
        })?;
        let connector = self.connectors.connector(ctx, connector_ref)?;
        let instruction = self.resolver().resolve(manifest, &connector, ctx)?;

        Ok(ManifestHandle {
            manifest: manifest.clone(),
            instruction,
        })
    }

    fn start_helm_deploy(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        handle: ManifestHandle,
        target_infra: TargetInfra,
    ) -> Result<ChainStepResult> {
        let plan = plan_overlays(&ctx.manifests)?;

        if !plan.has_remote() && handle.manifest.values_paths.is_empty() {
            debug!(inline = plan.inline.len(), "All values overlays are inline, executing directly");
            return self.execute(
                ctx,
                step,
                ExecuteInputs {
                    manifest: handle,
                    target_infra,
                    manifest_files: Vec::new(),
                    overlays: plan.inline,
                    rollback_target: None,
                    prepare_rollback_data: None,
                    first_deployment: false,
                    last_unit_progress: Vec::new(),
                },
            );
        }

        let resolver = self.resolver();
        let mut configs: Vec<GitFetchConfig> = Vec::new();
        let mut requested = Vec::new();
        let chart = &handle.manifest;

        let chart_store = match &chart.store {
            StoreConfig::Git(store) => Some(store),
            _ => None,
        };

        if let Some(store) = chart_store {
            let connector = self.connectors.connector(ctx, &store.connector_ref)?;
            let folder = store.folder_path.as_deref().unwrap_or_default();

            configs.push(resolver.resolve_git_paths(
                &chart.identifier,
                ManifestType::HelmChart,
                store,
                &connector,
                &[chart_values_file(chart, folder)],
                true,
            )?);
            if !chart.values_paths.is_empty() {
                configs.push(resolver.resolve_git_paths(
                    &chart.identifier,
                    ManifestType::HelmChart,
                    store,
                    &connector,
                    &chart.values_paths,
                    false,
                )?);
            }
            requested.push(chart.identifier.clone());

            for (overlay, paths) in &plan.inherited {
                configs.push(resolver.resolve_git_paths(
                    &overlay.identifier,
                    ManifestType::Values,
                    store,
                    &connector,
                    paths,
                    false,
                )?);
                requested.push(overlay.identifier.clone());
            }
        }

        for (overlay, store) in &plan.git {
            let connector = self.connectors.connector(ctx, &store.connector_ref)?;
            configs.push(resolver.resolve_git_paths(
                &overlay.identifier,
                ManifestType::Values,
                store,
                &connector,
                &store.paths,
                false,
            )?);
            requested.push(overlay.identifier.clone());
        }

        let values_fetch_pending = chart_store.is_none();
        let state = AwaitingValues {
            manifest: handle.clone(),
            target_infra,
            stage: FetchStage::Source,
            requested_refs: requested,
            pending_overlay_refs: plan.remote_order.clone(),
            accumulated_content: plan.inline.clone(),
            fetched_overlays: Default::default(),
            manifest_files: Vec::new(),
            values_fetch_pending,
            rollback_target: None,
            last_unit_progress: Vec::new(),
        };

        if configs.is_empty() {
            return self.values_fetch(ctx, step, state, true);
        }
        self.git_fetch(ctx, step, configs, state, true)
    }

    /// Fetches the manifest's own files before a serverless deploy or a rollback
    fn start_source_fetch(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        handle: ManifestHandle,
        target_infra: TargetInfra,
        rollback_target: Option<DeployOutcome>,
    ) -> Result<ChainStepResult> {
        let Some(config) = handle.instruction.as_git().cloned() else {
            return self.execute(
                ctx,
                step,
                ExecuteInputs {
                    manifest: handle,
                    target_infra,
                    manifest_files: Vec::new(),
                    overlays: Vec::new(),
                    rollback_target,
                    prepare_rollback_data: None,
                    first_deployment: false,
                    last_unit_progress: Vec::new(),
                },
            );
        };

        let state = AwaitingValues {
            requested_refs: vec![handle.identifier().to_string()],
            manifest: handle,
            target_infra,
            stage: FetchStage::Source,
            pending_overlay_refs: Vec::new(),
            accumulated_content: Vec::new(),
            fetched_overlays: Default::default(),
            manifest_files: Vec::new(),
            values_fetch_pending: false,
            rollback_target,
            last_unit_progress: Vec::new(),
        };
        self.git_fetch(ctx, step, vec![config], state, true)
    }

    fn git_fetch(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        configs: Vec<GitFetchConfig>,
        mut state: AwaitingValues,
        open_log_stream: bool,
    ) -> Result<ChainStepResult> {
        state.stage = FetchStage::Source;
        let params = GitFetchParams {
            account_id: ctx.account_id.clone(),
            fetch_files_configs: configs,
            open_log_stream,
            close_log_stream: !state.values_fetch_pending,
        };
        self.dispatcher().dispatch(
            OperationKind::GitFetch,
            &params,
            step,
            ctx,
            ChainContext::AwaitingValues(state),
        )
    }

    /// Reads the chart's own values, and values inherited from it, out of
    /// the chart package. Issued at most once per chain.
    fn values_fetch(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        mut state: AwaitingValues,
        open_log_stream: bool,
    ) -> Result<ChainStepResult> {
        let FetchInstruction::Chart(chart) = &state.manifest.instruction else {
            return Err(ChainError::config(format!(
                "Unsupported Store Config type: [{}]",
                state.manifest.manifest.store.type_name()
            )));
        };
        let chart = chart.clone();
        let manifest = &state.manifest.manifest;

        let mut chart_paths = vec![chart_values_file(manifest, "")];
        chart_paths.extend(normalize_paths(&manifest.values_paths));
        let mut values_paths = std::collections::BTreeMap::new();
        values_paths.insert(manifest.identifier.clone(), chart_paths);
        for (overlay, paths) in plan_overlays(&ctx.manifests)?.inherited {
            values_paths.insert(overlay.identifier.clone(), normalize_paths(paths));
        }

        state.requested_refs = values_paths.keys().cloned().collect();
        state.stage = FetchStage::Values;
        state.values_fetch_pending = false;

        let params = HelmValuesFetchParams {
            account_id: ctx.account_id.clone(),
            chart,
            values_paths,
            timeout_millis: self.dispatcher().timeout_millis(step)?,
            open_log_stream,
            close_log_stream: true,
        };
        self.dispatcher().dispatch(
            OperationKind::HelmValuesFetch,
            &params,
            step,
            ctx,
            ChainContext::AwaitingValues(state),
        )
    }

    /// Moves on once a fetch completed: another fetch, rollback preparation
    /// or the execution itself.
    fn proceed(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        state: AwaitingValues,
    ) -> Result<ChainStepResult> {
        if state.values_fetch_pending {
            return self.values_fetch(ctx, step, state, false);
        }
        if !state.pending_overlay_refs.is_empty() {
            warn!(pending = ?state.pending_overlay_refs, "Values overlays were never delivered");
        }

        let AwaitingValues {
            manifest,
            target_infra,
            manifest_files,
            accumulated_content,
            rollback_target,
            last_unit_progress,
            ..
        } = state;

        if self.technology.prepares_rollback() && !step.spec.is_rollback() {
            return self.prepare_rollback(ctx, step, manifest, target_infra, manifest_files, last_unit_progress);
        }

        self.execute(
            ctx,
            step,
            ExecuteInputs {
                manifest,
                target_infra,
                manifest_files,
                overlays: accumulated_content,
                rollback_target,
                prepare_rollback_data: None,
                first_deployment: false,
                last_unit_progress,
            },
        )
    }

    fn prepare_rollback(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        manifest: ManifestHandle,
        target_infra: TargetInfra,
        manifest_files: Vec<FetchedFile>,
        last_unit_progress: Vec<UnitProgress>,
    ) -> Result<ChainStepResult> {
        let target = serverless_target(&target_infra, step)?;
        let Some(main) = manifest_files.first() else {
            return Ok(self.missing_manifest_content(&manifest, &last_unit_progress));
        };

        let params = ServerlessPrepareRollbackParams {
            account_id: ctx.account_id.clone(),
            target,
            manifest_path: main.path.clone(),
            manifest_content: main.content.clone(),
            timeout_millis: self.dispatcher().timeout_millis(step)?,
        };
        self.dispatcher().dispatch(
            OperationKind::ServerlessPrepareRollback,
            &params,
            step,
            ctx,
            ChainContext::PreparingRollback(PreparingRollback {
                target_infra,
                manifest,
                manifest_files,
                last_unit_progress,
            }),
        )
    }

    fn execute(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        inputs: ExecuteInputs,
    ) -> Result<ChainStepResult> {
        let dispatcher = self.dispatcher();
        let timeout_millis = dispatcher.timeout_millis(step)?;
        let operation = self.technology.execute_operation(step.spec.is_rollback());
        let context = ChainContext::Executing(ExecutingState {
            target_infra: inputs.target_infra.clone(),
            manifest: inputs.manifest.clone(),
            last_unit_progress: inputs.last_unit_progress.clone(),
            versions: None,
            rollback_target: inputs.rollback_target.clone(),
            prepare_rollback_data: inputs.prepare_rollback_data.clone(),
            first_deployment: inputs.first_deployment,
        });

        match (&step.spec, &inputs.target_infra) {
            (
                StepSpec::HelmDeploy {
                    skip_dry_run,
                    ignore_release_hist_failed_status,
                    skip_steady_state_check,
                },
                TargetInfra::Kubernetes {
                    cluster_ref,
                    namespace,
                    release_name,
                },
            ) => {
                let mut values_yaml_list: Vec<String> = inputs
                    .manifest_files
                    .iter()
                    .map(|file| file.content.clone())
                    .collect();
                values_yaml_list.extend(inputs.overlays.iter().cloned());

                if let Err(err) = validate_values(&values_yaml_list) {
                    return Ok(self.step_exception(
                        format!("Error while fetching values yaml: {}", err),
                        &inputs.last_unit_progress,
                    ));
                }

                let params = HelmDeployParams {
                    account_id: ctx.account_id.clone(),
                    release_name: release_name.clone(),
                    namespace: namespace.clone(),
                    cluster_ref: cluster_ref.clone(),
                    manifest: inputs.manifest.instruction.clone(),
                    helm_version: inputs.manifest.manifest.helm_version,
                    values_yaml_list,
                    skip_dry_run: *skip_dry_run,
                    ignore_release_hist_failed_status: *ignore_release_hist_failed_status,
                    skip_steady_state_check: *skip_steady_state_check,
                    timeout_millis,
                };
                dispatcher.dispatch(operation, &params, step, ctx, context)
            }
            (
                StepSpec::HelmRollback { skip_dry_run, .. },
                TargetInfra::Kubernetes {
                    cluster_ref,
                    namespace,
                    ..
                },
            ) => {
                let prior = rollback_target(&inputs)?;
                let params = HelmRollbackParams {
                    account_id: ctx.account_id.clone(),
                    release_name: prior.release_name.clone(),
                    namespace: namespace.clone(),
                    cluster_ref: cluster_ref.clone(),
                    rollback_version: prior.previous_release_version,
                    helm_version: inputs.manifest.manifest.helm_version,
                    manifest_files: inputs.manifest_files.clone(),
                    skip_dry_run: *skip_dry_run,
                    timeout_millis,
                };
                dispatcher.dispatch(operation, &params, step, ctx, context)
            }
            (StepSpec::ServerlessDeploy { command_options }, infra @ TargetInfra::Serverless { .. }) => {
                let Some(main) = inputs.manifest_files.first() else {
                    return Ok(self.missing_manifest_content(&inputs.manifest, &inputs.last_unit_progress));
                };
                let params = ServerlessDeployParams {
                    account_id: ctx.account_id.clone(),
                    target: serverless_target(infra, step)?,
                    manifest_path: main.path.clone(),
                    manifest_content: main.content.clone(),
                    command_options: command_options.clone(),
                    prepare_rollback_data: inputs.prepare_rollback_data.clone(),
                    timeout_millis,
                };
                dispatcher.dispatch(operation, &params, step, ctx, context)
            }
            (StepSpec::ServerlessRollback { .. }, infra @ TargetInfra::Serverless { .. }) => {
                let prior = rollback_target(&inputs)?;
                let Some(main) = inputs.manifest_files.first() else {
                    return Ok(self.missing_manifest_content(&inputs.manifest, &inputs.last_unit_progress));
                };
                let params = ServerlessRollbackParams {
                    account_id: ctx.account_id.clone(),
                    target: serverless_target(infra, step)?,
                    manifest_path: main.path.clone(),
                    manifest_content: main.content.clone(),
                    previous_version_marker: prior.prepare_rollback_data.clone(),
                    first_deployment: prior.first_deployment,
                    timeout_millis,
                };
                dispatcher.dispatch(operation, &params, step, ctx, context)
            }
            (spec, infra) => Err(ChainError::config(format!(
                "Infrastructure type {} is not supported for {} step",
                infra.type_name(),
                spec.display_name()
            ))),
        }
    }

    /// Terminal step exception; running units are closed as failed
    fn step_exception(&self, message: impl Into<String>, units: &[UnitProgress]) -> ChainStepResult {
        let message = message.into();
        warn!(message = %message, "Chain ended with step exception");
        ChainStepResult::terminal(ChainContext::StepException(FailureInfo::new(
            message,
            complete_unit_progress(units, Utc::now()),
        )))
    }

    fn missing_manifest_content(&self, manifest: &ManifestHandle, units: &[UnitProgress]) -> ChainStepResult {
        self.step_exception(
            format!(
                "No manifest content was fetched for manifest [{}]",
                manifest.identifier()
            ),
            units,
        )
    }
}

fn rollback_target(inputs: &ExecuteInputs) -> Result<&DeployOutcome> {
    inputs
        .rollback_target
        .as_ref()
        .ok_or_else(|| ChainError::config("No deploy outcome available to roll back"))
}

fn serverless_target(infra: &TargetInfra, step: &StepConfig) -> Result<ServerlessTarget> {
    match infra {
        TargetInfra::Serverless {
            region,
            stage,
            connector_ref,
        } => Ok(ServerlessTarget {
            region: region.clone(),
            stage: stage.clone(),
            connector_ref: connector_ref.clone(),
        }),
        other => Err(ChainError::config(format!(
            "Infrastructure type {} is not supported for {} step",
            other.type_name(),
            step.spec.display_name()
        ))),
    }
}
