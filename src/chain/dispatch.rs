//! Task dispatch: remote call construction

use std::collections::BTreeSet;

use serde::Serialize;

use super::{ChainContext, ChainStepResult, OperationKind, RemoteCallRequest};
use crate::config::{EngineConfig, StepConfig, parse_timeout_millis};
use crate::domain::ExecutionContext;
use crate::error::Result;

/// Builds remote calls for a step. Holds no state besides the shared config.
#[derive(Debug, Clone, Copy)]
pub struct TaskDispatcher<'a> {
    config: &'a EngineConfig,
}

impl<'a> TaskDispatcher<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Step timeout in milliseconds, engine default when the step has none
    pub fn timeout_millis(&self, step: &StepConfig) -> Result<u64> {
        let timeout = step
            .timeout
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.config.default_timeout.as_str());
        parse_timeout_millis(timeout)
    }

    pub fn build_call<P: Serialize>(
        &self,
        operation: OperationKind,
        params: &P,
        step: &StepConfig,
        ctx: &ExecutionContext,
    ) -> Result<RemoteCallRequest> {
        let selectors: BTreeSet<String> = step
            .delegate_selectors
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(RemoteCallRequest {
            operation,
            task_type: operation.task_type().to_string(),
            task_name: operation.display_name().to_string(),
            account_id: ctx.account_id.clone(),
            params: serde_json::to_value(params)?,
            timeout_millis: self.timeout_millis(step)?,
            command_units: step
                .spec
                .command_units()
                .iter()
                .map(|unit| unit.to_string())
                .collect(),
            selectors,
            async_flag: true,
        })
    }

    /// Builds the call and pairs it with the outgoing context
    pub fn dispatch<P: Serialize>(
        &self,
        operation: OperationKind,
        params: &P,
        step: &StepConfig,
        ctx: &ExecutionContext,
        context: ChainContext,
    ) -> Result<ChainStepResult> {
        let call = self.build_call(operation, params, step, ctx)?;
        tracing::debug!(
            operation = %operation,
            state = context.state_name(),
            timeout_millis = call.timeout_millis,
            "Dispatching remote call"
        );
        Ok(ChainStepResult::next(call, context))
    }
}
