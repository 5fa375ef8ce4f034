//! Response classification: agent response plus current context into the
//! next chain step.

use tracing::{debug, info, warn};

use super::context::{AwaitingValues, ChainContext, ExecutingState, FailureInfo, FetchStage, PreparingRollback};
use super::release::{compute_deploy_version, compute_rollback_version};
use super::response::{AgentResponse, CommandStatus, ErrorKind, ExecuteResponse, FetchResponse, RollbackPrepResponse};
use super::{ChainController, ChainStepResult, ExecuteInputs};
use crate::config::StepConfig;
use crate::domain::ExecutionContext;
use crate::error::{ChainError, Result};

impl ChainController<'_> {
    /// Classifies the response to the outstanding call.
    ///
    /// Settled contexts (failures and skips) are returned unchanged whatever
    /// the response. The response shape must agree with the context; any
    /// mismatch or classification failure ends the chain with a step
    /// exception. Transport faults are returned as
    /// [`ChainError::Infrastructure`] so the caller can retry the call.
    pub fn classify(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        current: &ChainContext,
        response: &AgentResponse,
    ) -> Result<ChainStepResult> {
        if current.is_settled() {
            debug!(state = current.state_name(), "Chain already settled, ignoring response");
            return Ok(ChainStepResult::terminal(current.clone()));
        }

        match self.classify_response(ctx, step, current, response) {
            Ok(result) => Ok(result),
            Err(err) if err.is_infrastructure() => Err(err),
            Err(err) => Ok(self.step_exception(err.to_string(), latest_units(current, response))),
        }
    }

    fn classify_response(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        current: &ChainContext,
        response: &AgentResponse,
    ) -> Result<ChainStepResult> {
        match (response, current) {
            (AgentResponse::Error(error), _) => match error.kind {
                ErrorKind::Transport => Err(ChainError::Infrastructure(error.message.clone())),
                ErrorKind::Remote => Ok(self.step_exception(error.message.clone(), current.unit_progress())),
            },
            (AgentResponse::SourceFetch(fetch), ChainContext::AwaitingValues(state))
                if state.stage == FetchStage::Source =>
            {
                self.on_fetch(ctx, step, state, fetch)
            }
            (AgentResponse::ValuesFetch(fetch), ChainContext::AwaitingValues(state))
                if state.stage == FetchStage::Values =>
            {
                self.on_fetch(ctx, step, state, fetch)
            }
            (AgentResponse::RollbackPrep(prep), ChainContext::PreparingRollback(state)) => {
                self.on_rollback_prep(ctx, step, state, prep)
            }
            (AgentResponse::Execute(execution), ChainContext::Executing(state)) => {
                self.on_execute(state, execution)
            }
            (response, current) => Ok(self.step_exception(
                format!(
                    "Unexpected response {} for chain state {}",
                    response.shape_name(),
                    current.state_name()
                ),
                latest_units(current, response),
            )),
        }
    }

    fn on_fetch(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        state: &AwaitingValues,
        fetch: &FetchResponse,
    ) -> Result<ChainStepResult> {
        if fetch.status != CommandStatus::Success {
            let (label, wrap): (&str, fn(FailureInfo) -> ChainContext) = match state.stage {
                FetchStage::Source => ("Source fetch failed", ChainContext::SourceFetchFailed),
                FetchStage::Values => ("Values fetch failed", ChainContext::ValuesFetchFailed),
            };
            let message = fetch
                .error_message
                .clone()
                .unwrap_or_else(|| label.to_string());
            info!(stage = ?state.stage, message = %message, "Fetch reported failure");
            return Ok(ChainStepResult::terminal(wrap(FailureInfo::new(
                message,
                fetch.unit_progress.clone(),
            ))));
        }

        let mut next = state.clone();
        next.absorb(&fetch.files);
        next.last_unit_progress = fetch.unit_progress.clone();
        debug!(
            stage = ?state.stage,
            accumulated = next.accumulated_content.len(),
            pending = next.pending_overlay_refs.len(),
            "Fetch completed"
        );
        self.proceed(ctx, step, next)
    }

    fn on_rollback_prep(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        state: &PreparingRollback,
        prep: &RollbackPrepResponse,
    ) -> Result<ChainStepResult> {
        if prep.status != CommandStatus::Success {
            let message = prep
                .error_message
                .clone()
                .unwrap_or_else(|| "Failed to prepare rollback data".to_string());
            return Ok(self.step_exception(message, &prep.unit_progress));
        }
        if prep.first_deployment {
            info!("No previous deployment found, rollback will remove the stack");
        }

        self.execute(
            ctx,
            step,
            ExecuteInputs {
                manifest: state.manifest.clone(),
                target_infra: state.target_infra.clone(),
                manifest_files: state.manifest_files.clone(),
                overlays: Vec::new(),
                rollback_target: None,
                prepare_rollback_data: prep.rollback_data.clone(),
                first_deployment: prep.first_deployment,
                last_unit_progress: prep.unit_progress.clone(),
            },
        )
    }

    fn on_execute(&self, state: &ExecutingState, execution: &ExecuteResponse) -> Result<ChainStepResult> {
        let mut next = state.clone();
        next.last_unit_progress = execution.unit_progress.clone();

        if execution.status == CommandStatus::Success {
            let versions = match &state.rollback_target {
                Some(prior) => compute_rollback_version(prior),
                None => compute_deploy_version(&execution.release_history)?,
            };
            info!(
                previous_version = versions.previous_version,
                new_version = versions.new_version,
                "Execution succeeded"
            );
            next.versions = Some(versions);
        } else {
            warn!(
                error = execution.error_message.as_deref().unwrap_or_default(),
                "Execution failed"
            );
        }

        Ok(ChainStepResult::terminal(ChainContext::Executing(next)))
    }
}

/// Units reported with the response, or the last known ones when it has none
fn latest_units<'r>(current: &'r ChainContext, response: &'r AgentResponse) -> &'r [crate::domain::UnitProgress] {
    if response.unit_progress().is_empty() {
        current.unit_progress()
    } else {
        response.unit_progress()
    }
}
