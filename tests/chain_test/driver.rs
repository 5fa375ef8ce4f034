//! Async driver against a scripted delegate

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use taskchain::chain::{
    AgentResponse, ExecuteResponse, FetchResponse, OperationKind, OutcomeStatus, RemoteCallRequest,
};
use taskchain::config::{DriverSettings, StepConfig};
use taskchain::driver::{ChainDriver, DelegateError, TaskDelegate};

use crate::common::{Harness, git_chart, git_values, helm_ctx};

/// Replays queued responses and records every submitted operation
struct ScriptedDelegate {
    responses: Mutex<VecDeque<Result<AgentResponse, DelegateError>>>,
    submitted: Mutex<Vec<OperationKind>>,
}

impl ScriptedDelegate {
    fn new(responses: Vec<Result<AgentResponse, DelegateError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn submitted(&self) -> Vec<OperationKind> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskDelegate for ScriptedDelegate {
    async fn submit(&self, request: &RemoteCallRequest) -> Result<AgentResponse, DelegateError> {
        self.submitted.lock().unwrap().push(request.operation);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DelegateError::Remote("no scripted response".to_string())))
    }
}

fn fast_retries(max_transport_retries: u32) -> DriverSettings {
    DriverSettings {
        max_transport_retries,
        retry_backoff_ms: 1,
    }
}

#[tokio::test]
async fn test_driver_runs_deploy_to_completion() {
    let harness = Harness::new();
    let driver = ChainDriver::new(harness.helm());
    let ctx = helm_ctx(vec![git_chart(), git_values("remote", "values.yaml")]);
    let step = StepConfig::helm_deploy("deploy");

    let delegate = ScriptedDelegate::new(vec![
        Ok(AgentResponse::SourceFetch(
            FetchResponse::success().with_file("remote", "values.yaml", "a: 1"),
        )),
        Ok(AgentResponse::Execute(ExecuteResponse::success().with_history(["1", "2"]))),
    ]);

    let outcome = driver.run(&ctx, &step, &delegate).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    assert_eq!(outcome.deploy_outcome.unwrap().new_release_version, 3);
    assert_eq!(
        delegate.submitted(),
        vec![OperationKind::GitFetch, OperationKind::HelmDeploy]
    );
    assert_eq!(harness.outcomes.len(), 1);
}

#[tokio::test]
async fn test_driver_retries_transport_failures() {
    let harness = Harness::new();
    let driver = ChainDriver::new(harness.helm()).with_settings(fast_retries(2));
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_deploy("deploy");

    let delegate = ScriptedDelegate::new(vec![
        Err(DelegateError::Transport("connection reset".to_string())),
        Err(DelegateError::Transport("connection reset".to_string())),
        Ok(AgentResponse::Execute(ExecuteResponse::success())),
    ]);

    let outcome = driver.run(&ctx, &step, &delegate).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(delegate.submitted().len(), 3);
}

#[tokio::test]
async fn test_driver_gives_up_after_retries() {
    let harness = Harness::new();
    let driver = ChainDriver::new(harness.helm()).with_settings(fast_retries(1));
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_deploy("deploy");

    let delegate = ScriptedDelegate::new(vec![
        Err(DelegateError::Transport("no route to host".to_string())),
        Err(DelegateError::Transport("no route to host".to_string())),
    ]);

    let err = driver.run(&ctx, &step, &delegate).await.unwrap_err();

    assert!(err.is_infrastructure());
    assert!(err.to_string().contains("unreachable after 2 attempts"));
    assert_eq!(delegate.submitted().len(), 2);
    assert!(harness.outcomes.is_empty());
}

#[tokio::test]
async fn test_driver_remote_error_fails_step() {
    let harness = Harness::new();
    let driver = ChainDriver::new(harness.helm());
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_deploy("deploy");

    let delegate = ScriptedDelegate::new(vec![Err(DelegateError::Remote(
        "kubeconfig rejected".to_string(),
    ))]);

    let outcome = driver.run(&ctx, &step, &delegate).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.message.as_deref(), Some("kubeconfig rejected"));
}

#[tokio::test]
async fn test_driver_skipped_rollback_submits_nothing() {
    let harness = Harness::new();
    let driver = ChainDriver::new(harness.helm());
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_rollback("rollback", "deploy");
    let delegate = ScriptedDelegate::new(Vec::new());

    let outcome = driver.run(&ctx, &step, &delegate).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Skipped);
    assert!(delegate.submitted().is_empty());
}

#[tokio::test]
async fn test_driver_returns_configuration_errors() {
    let harness = Harness::new();
    let driver = ChainDriver::new(harness.helm());
    let ctx = helm_ctx(Vec::new());
    let delegate = ScriptedDelegate::new(Vec::new());

    let err = driver
        .run(&ctx, &StepConfig::helm_deploy("deploy"), &delegate)
        .await
        .unwrap_err();

    assert!(!err.is_infrastructure());
    assert!(delegate.submitted().is_empty());
}
