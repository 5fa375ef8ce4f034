//! Serverless deploy and rollback chains

use taskchain::chain::{
    AgentResponse, ChainContext, CommandStatus, ExecuteResponse, FetchResponse, GitFetchParams,
    OperationKind, OutcomeStatus, RollbackPrepResponse, ServerlessDeployParams,
    ServerlessPrepareRollbackParams, ServerlessRollbackParams,
};
use taskchain::config::StepConfig;
use taskchain::store::{OutcomeStore, outcome_key};
use taskchain::{ChainError, ManifestOutcome, ManifestType, StoreConfig, UnitStatus};

use crate::common::{Harness, STAGE_KEY, params, serverless_ctx, serverless_manifest, units};

const MANIFEST: &str = "service: orders\nprovider:\n  name: aws\n";

fn prep(rollback_data: Option<&str>) -> AgentResponse {
    AgentResponse::RollbackPrep(RollbackPrepResponse {
        status: CommandStatus::Success,
        error_message: None,
        unit_progress: units(&[("Prepare Rollback Data", UnitStatus::Success)]),
        rollback_data: rollback_data.map(str::to_string),
        first_deployment: rollback_data.is_none(),
    })
}

fn manifest_files() -> AgentResponse {
    AgentResponse::SourceFetch(
        FetchResponse::success().with_file("lambda", "serverless.yaml", MANIFEST),
    )
}

#[test]
fn test_serverless_deploy_chain() {
    let harness = Harness::new();
    let controller = harness.serverless();
    let ctx = serverless_ctx(vec![serverless_manifest()]);
    let step = StepConfig::serverless_deploy("deploy");

    let first = controller.advance(&ctx, &step, None, None).unwrap();
    let call = first.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::GitFetch);
    let fetch: GitFetchParams = params(call);
    assert_eq!(fetch.fetch_files_configs[0].repo_url, "https://github.com/acme/functions");
    assert_eq!(fetch.fetch_files_configs[0].paths, vec!["serverless.yaml"]);

    let second = controller
        .advance(&ctx, &step, Some(first.context()), Some(&manifest_files()))
        .unwrap();
    let call = second.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::ServerlessPrepareRollback);
    assert_eq!(call.task_type, "SERVERLESS_COMMAND_TASK");
    let prepare: ServerlessPrepareRollbackParams = params(call);
    assert_eq!(prepare.manifest_content, MANIFEST);
    assert_eq!(prepare.target.region, "us-east-1");
    assert!(matches!(second.context(), ChainContext::PreparingRollback(_)));

    let third = controller
        .advance(&ctx, &step, Some(second.context()), Some(&prep(Some("v1"))))
        .unwrap();
    let call = third.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::ServerlessDeploy);
    let deploy: ServerlessDeployParams = params(call);
    assert_eq!(deploy.prepare_rollback_data.as_deref(), Some("v1"));
    assert_eq!(deploy.manifest_path, "serverless.yaml");

    let response = AgentResponse::Execute(ExecuteResponse::success());
    let done = controller
        .advance(&ctx, &step, Some(third.context()), Some(&response))
        .unwrap();
    assert!(done.is_final());

    let outcome = controller.finalize(&ctx, &step, done.context(), Some(&response));
    assert_eq!(outcome.status, OutcomeStatus::Succeeded);

    let stored = harness
        .outcomes
        .load(&outcome_key(STAGE_KEY, "deploy", "SERVERLESS_DEPLOY_OUTCOME"))
        .unwrap();
    assert_eq!(stored.prepare_rollback_data.as_deref(), Some("v1"));
    assert!(!stored.first_deployment);
}

#[test]
fn test_serverless_rollback_uses_recorded_marker() {
    let harness = Harness::new();
    let controller = harness.serverless();
    let ctx = serverless_ctx(vec![serverless_manifest()]);
    let deploy = StepConfig::serverless_deploy("deploy");

    // Run the deploy first so its outcome is recorded
    let mut result = controller.advance(&ctx, &deploy, None, None).unwrap();
    let execute = AgentResponse::Execute(ExecuteResponse::success());
    for response in [manifest_files(), prep(Some("v1")), execute.clone()] {
        result = controller
            .advance(&ctx, &deploy, Some(result.context()), Some(&response))
            .unwrap();
    }
    controller.finalize(&ctx, &deploy, result.context(), Some(&execute));

    let rollback = StepConfig::serverless_rollback("rollback", "deploy");
    let first = controller.advance(&ctx, &rollback, None, None).unwrap();
    assert_eq!(first.next_call().unwrap().operation, OperationKind::GitFetch);

    let second = controller
        .advance(&ctx, &rollback, Some(first.context()), Some(&manifest_files()))
        .unwrap();
    let call = second.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::ServerlessRollback);
    let rollback_params: ServerlessRollbackParams = params(call);
    assert_eq!(rollback_params.previous_version_marker.as_deref(), Some("v1"));
    assert!(!rollback_params.first_deployment);
}

#[test]
fn test_serverless_rollback_skipped_without_deploy() {
    let harness = Harness::new();
    let ctx = serverless_ctx(vec![serverless_manifest()]);
    let step = StepConfig::serverless_rollback("rollback", "deploy");

    let result = harness.serverless().advance(&ctx, &step, None, None).unwrap();

    match result.context() {
        ChainContext::Skipped { message } => {
            assert_eq!(message, "Serverless Deploy step was not executed. Skipping rollback.");
        }
        other => panic!("unexpected context {}", other.state_name()),
    }
}

#[test]
fn test_rollback_prep_failure_ends_chain() {
    let harness = Harness::new();
    let controller = harness.serverless();
    let ctx = serverless_ctx(vec![serverless_manifest()]);
    let step = StepConfig::serverless_deploy("deploy");

    let first = controller.advance(&ctx, &step, None, None).unwrap();
    let second = controller
        .advance(&ctx, &step, Some(first.context()), Some(&manifest_files()))
        .unwrap();

    let failure = AgentResponse::RollbackPrep(RollbackPrepResponse {
        status: CommandStatus::Failure,
        error_message: Some("stack is locked".to_string()),
        unit_progress: units(&[("Prepare Rollback Data", UnitStatus::Running)]),
        rollback_data: None,
        first_deployment: false,
    });
    let result = controller
        .advance(&ctx, &step, Some(second.context()), Some(&failure))
        .unwrap();

    assert!(matches!(result.context(), ChainContext::StepException(_)));
    let outcome = controller.finalize(&ctx, &step, result.context(), Some(&failure));
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.message.as_deref(), Some("stack is locked"));
    assert_eq!(outcome.unit_progress[0].status, UnitStatus::Failure);
}

#[test]
fn test_empty_manifest_fetch_fails_step() {
    let harness = Harness::new();
    let controller = harness.serverless();
    let ctx = serverless_ctx(vec![serverless_manifest()]);
    let step = StepConfig::serverless_deploy("deploy");

    let first = controller.advance(&ctx, &step, None, None).unwrap();
    let empty = AgentResponse::SourceFetch(FetchResponse::success());
    let result = controller
        .advance(&ctx, &step, Some(first.context()), Some(&empty))
        .unwrap();

    let info = result.context().failure().unwrap();
    assert_eq!(info.message, "No manifest content was fetched for manifest [lambda]");
}

#[test]
fn test_serverless_manifest_outside_git_is_unsupported() {
    let harness = Harness::new();
    let manifest = ManifestOutcome::new(
        "lambda",
        ManifestType::ServerlessAwsLambda,
        StoreConfig::S3 {
            connector_ref: "aws".to_string(),
            bucket_name: "artifacts".to_string(),
            region: "us-east-1".to_string(),
            folder_path: None,
        },
    );
    let ctx = serverless_ctx(vec![manifest]);

    let err = harness
        .serverless()
        .advance(&ctx, &StepConfig::serverless_deploy("deploy"), None, None)
        .unwrap_err();

    match err {
        ChainError::Configuration(message) => {
            assert!(message.starts_with("Unsupported Store Config type"), "{}", message)
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}
