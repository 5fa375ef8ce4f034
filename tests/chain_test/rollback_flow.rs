//! Rollback chains and the skip path

use taskchain::chain::{
    AgentResponse, ChainContext, ExecuteResponse, FetchResponse, GitFetchParams,
    HelmRollbackParams, OperationKind, OutcomeStatus,
};
use taskchain::config::StepConfig;
use taskchain::store::{OutcomeStore, outcome_key};
use taskchain::DeployOutcome;

use crate::common::{Harness, STAGE_KEY, git_chart, helm_ctx, params, repo_chart};

fn recorded_deploy(harness: &Harness, previous: u32) -> DeployOutcome {
    let outcome = DeployOutcome {
        release_name: "web".to_string(),
        previous_release_version: previous,
        new_release_version: previous + 1,
        deployed_resources: vec!["Deployment/web".to_string()],
        prepare_rollback_data: None,
        first_deployment: false,
    };
    harness.outcomes.save(
        &outcome_key(STAGE_KEY, "deploy", "HELM_DEPLOY_OUTCOME"),
        outcome.clone(),
    );
    outcome
}

#[test]
fn test_rollback_without_deploy_outcome_is_skipped() {
    let harness = Harness::new();
    let controller = harness.helm();
    // No infrastructure and no manifests: the skip check comes first
    let mut ctx = helm_ctx(Vec::new());
    ctx.infrastructure = None;
    let step = StepConfig::helm_rollback("rollback", "deploy");

    let result = controller.advance(&ctx, &step, None, None).unwrap();

    assert!(result.is_final());
    assert!(result.next_call().is_none());
    match result.context() {
        ChainContext::Skipped { message } => {
            assert_eq!(message, "Helm Deploy step was not executed. Skipping rollback.");
        }
        other => panic!("unexpected context {}", other.state_name()),
    }

    let outcome = controller.finalize(&ctx, &step, result.context(), None);
    assert_eq!(outcome.status, OutcomeStatus::Skipped);
    assert!(outcome.message.unwrap().contains("Skipping rollback"));
    assert!(outcome.deploy_outcome.is_none());
}

#[test]
fn test_rollback_with_blank_reference_is_skipped() {
    let harness = Harness::new();
    recorded_deploy(&harness, 5);
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_rollback("rollback", "  ");

    let result = harness.helm().advance(&ctx, &step, None, None).unwrap();

    assert!(matches!(result.context(), ChainContext::Skipped { .. }));
}

#[test]
fn test_git_chart_rollback() {
    let harness = Harness::new();
    let controller = harness.helm();
    recorded_deploy(&harness, 5);
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_rollback("rollback", "deploy");

    let first = controller.advance(&ctx, &step, None, None).unwrap();
    let call = first.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::GitFetch);
    let fetch: GitFetchParams = params(call);
    assert_eq!(fetch.fetch_files_configs.len(), 1);
    assert_eq!(fetch.fetch_files_configs[0].paths, vec!["charts/web"]);
    assert!(fetch.open_log_stream && fetch.close_log_stream);

    let files = AgentResponse::SourceFetch(
        FetchResponse::success().with_file("chart", "charts/web/Chart.yaml", "name: web"),
    );
    let second = controller
        .advance(&ctx, &step, Some(first.context()), Some(&files))
        .unwrap();
    let call = second.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::HelmRollback);
    let rollback: HelmRollbackParams = params(call);
    assert_eq!(rollback.rollback_version, 5);
    assert_eq!(rollback.release_name, "web");
    assert_eq!(rollback.manifest_files.len(), 1);

    let response = AgentResponse::Execute(ExecuteResponse::success());
    let done = controller
        .advance(&ctx, &step, Some(second.context()), Some(&response))
        .unwrap();
    let outcome = controller.finalize(&ctx, &step, done.context(), Some(&response));

    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    let record = outcome.deploy_outcome.unwrap();
    assert_eq!(record.previous_release_version, 5);
    assert_eq!(record.new_release_version, 7);
    // Rollbacks do not overwrite the deploy outcome
    assert_eq!(harness.outcomes.len(), 1);
    let stored = harness
        .outcomes
        .load(&outcome_key(STAGE_KEY, "deploy", "HELM_DEPLOY_OUTCOME"))
        .unwrap();
    assert_eq!(stored.new_release_version, 6);
}

#[test]
fn test_repo_chart_rollback_executes_directly() {
    let harness = Harness::new();
    recorded_deploy(&harness, 2);
    let ctx = helm_ctx(vec![repo_chart()]);
    let step = StepConfig::helm_rollback("rollback", "deploy");

    let result = harness.helm().advance(&ctx, &step, None, None).unwrap();

    let call = result.next_call().unwrap();
    assert_eq!(call.operation, OperationKind::HelmRollback);
    assert_eq!(call.task_type, "HELM_COMMAND_TASK_NG");
    let rollback: HelmRollbackParams = params(call);
    assert_eq!(rollback.rollback_version, 2);
    assert!(rollback.manifest_files.is_empty());
}

#[test]
fn test_rollback_of_unknown_step_is_skipped() {
    let harness = Harness::new();
    recorded_deploy(&harness, 5);
    let ctx = helm_ctx(vec![git_chart()]);
    let step = StepConfig::helm_rollback("rollback", "other-deploy");

    let result = harness.helm().advance(&ctx, &step, None, None).unwrap();

    assert!(result.is_final());
    assert!(matches!(result.context(), ChainContext::Skipped { .. }));
}
