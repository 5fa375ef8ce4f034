//! Async chain driver
//!
//! Submits each remote call of a chain to a [`TaskDelegate`], feeds the
//! response back into the controller and finalizes the chain. At most one
//! call per chain is outstanding at any time.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chain::{AgentResponse, ChainController, RemoteCallRequest, StepOutcome};
use crate::config::{DriverSettings, StepConfig};
use crate::domain::ExecutionContext;
use crate::error::{ChainError, Result};

/// Failure to obtain a response from the agent
#[derive(Debug, Clone, thiserror::Error)]
pub enum DelegateError {
    /// The agent could not be reached; the call may be retried
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The agent accepted the task and raised an error
    #[error("{0}")]
    Remote(String),
}

/// Trait for agent transports
#[async_trait]
pub trait TaskDelegate: Send + Sync {
    /// Submit a call and wait for the agent's response
    async fn submit(&self, request: &RemoteCallRequest) -> std::result::Result<AgentResponse, DelegateError>;
}

/// Runs chains end to end against a delegate
pub struct ChainDriver<'a> {
    controller: ChainController<'a>,
    settings: DriverSettings,
}

impl<'a> ChainDriver<'a> {
    pub fn new(controller: ChainController<'a>) -> Self {
        let settings = controller.config().driver.clone();
        Self {
            controller,
            settings,
        }
    }

    pub fn with_settings(mut self, settings: DriverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs one chain to completion.
    ///
    /// Configuration errors and unrecoverable transport faults are returned as
    /// `Err`; every other failure ends up in the returned [`StepOutcome`].
    pub async fn run(
        &self,
        ctx: &ExecutionContext,
        step: &StepConfig,
        delegate: &dyn TaskDelegate,
    ) -> Result<StepOutcome> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, step = %step.identifier, "Running chain");

        let mut result = self.controller.advance(ctx, step, None, None)?;
        let mut last_response: Option<AgentResponse> = None;

        loop {
            let (call, context) = result.into_parts();
            let Some(call) = call else {
                let outcome = self
                    .controller
                    .finalize(ctx, step, &context, last_response.as_ref());
                info!(
                    run_id = %run_id,
                    state = context.state_name(),
                    status = %outcome.status,
                    "Chain finished"
                );
                return Ok(outcome);
            };

            let response = self.submit_with_retry(run_id, delegate, &call).await?;
            result = self
                .controller
                .advance(ctx, step, Some(&context), Some(&response))?;
            last_response = Some(response);
        }
    }

    async fn submit_with_retry(
        &self,
        run_id: Uuid,
        delegate: &dyn TaskDelegate,
        call: &RemoteCallRequest,
    ) -> Result<AgentResponse> {
        let mut attempt: u32 = 0;
        loop {
            debug!(run_id = %run_id, operation = %call.operation, attempt, "Submitting remote call");
            match delegate.submit(call).await {
                Ok(response) => return Ok(response),
                Err(DelegateError::Remote(message)) => {
                    return Ok(AgentResponse::remote_error(message));
                }
                Err(DelegateError::Transport(message)) => {
                    if attempt >= self.settings.max_transport_retries {
                        return Err(ChainError::Infrastructure(format!(
                            "{} unreachable after {} attempts: {}",
                            call.task_name,
                            attempt + 1,
                            message
                        )));
                    }
                    attempt += 1;
                    let backoff = self.settings.retry_backoff_ms.saturating_mul(u64::from(attempt));
                    warn!(
                        run_id = %run_id,
                        operation = %call.operation,
                        attempt,
                        backoff_ms = backoff,
                        error = %message,
                        "Delegate unreachable, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }
}
