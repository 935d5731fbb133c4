mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use std::sync::Arc;

use common::{
    BlindLookupRepository, SCRIPT_ID, ScriptedExecutor, UnavailableStore, harness,
    harness_with_scripts, orchestrator, snapshot, wait_for,
};
use runway_core::domain::script::ScriptSpec;
use runway_orchestrator::definitions::CatalogScriptStore;
use runway_orchestrator::repository::InMemoryExecutionRepository;
use runway_core::domain::execution::{ExecutionResult, ExecutionStatus};
use runway_core::dto::execution::RunRequest;
use runway_orchestrator::executor::DispatchError;
use runway_orchestrator::repository::ExecutionRepository;
use runway_orchestrator::service::ExecutionError;

fn success_after_three_polls() -> Vec<ExecutionResult> {
    vec![
        snapshot(ExecutionStatus::Queued, ""),
        snapshot(ExecutionStatus::Queued, ""),
        ExecutionResult {
            end_time: Some(Utc::now() + chrono::Duration::seconds(1)),
            ..snapshot(ExecutionStatus::Success, "OK")
        },
    ]
}

#[tokio::test(start_paused = true)]
async fn test_run_is_queued_then_recorded_as_successful() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));

    let execution = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1").with_param("key", "value"))
        .await
        .unwrap();

    assert!(!execution.id.is_nil());
    assert!(execution.result.is_queued());
    assert_eq!(execution.name, "run-1");
    assert_eq!(execution.parameters.params.get("key"), Some(&"value".to_string()));
    assert_eq!(h.orchestrator.get(execution.id).await.unwrap(), execution);

    let stored = wait_for(&h.repository, &execution, |e| e.result.is_completed()).await;

    assert!(stored.result.is_successful());
    assert_eq!(stored.result.output, "OK");
    let (start, end) = (stored.result.start_time.unwrap(), stored.result.end_time.unwrap());
    assert!(end > start);
    assert!(stored.result.duration().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_options_carry_spec_and_parameters() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));

    let mut request = RunRequest::new("run-1").with_param("key", "value");
    request.parameters.image = Some("curlimages/curl:8.5.0".to_string());
    request
        .parameters
        .envs
        .insert("TARGET".to_string(), "staging".to_string());

    h.orchestrator.execute_run(SCRIPT_ID, request).await.unwrap();

    let options = h.executor.last_options().unwrap();
    assert_eq!(options.spec.script_type, common::SCRIPT_TYPE);
    assert_eq!(options.spec.content.as_deref(), Some("curl -sf http://demo/health"));
    assert_eq!(options.parameters.image.as_deref(), Some("curlimages/curl:8.5.0"));
    assert_eq!(options.parameters.envs.get("TARGET"), Some(&"staging".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_name_conflicts_without_dispatch() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));
    h.orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap();
    let calls = h.executor.execute_calls();

    let err = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap_err();

    assert_matches!(&err, ExecutionError::Conflict { name } if name == "run-1");
    assert_eq!(
        err.to_string(),
        "script execution with name run-1 already exists"
    );
    assert_eq!(h.executor.execute_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_failure_stores_nothing() {
    let h = harness(ScriptedExecutor::failing());

    let err = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap_err();

    assert_matches!(err, ExecutionError::Dispatch(DispatchError::Unreachable(_)));
    assert!(
        h.orchestrator
            .get_by_name_and_script("run-1", SCRIPT_ID)
            .await
            .unwrap()
            .is_none()
    );
    assert!(h.repository.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_updates_after_terminal_are_not_persisted() {
    let h = harness(ScriptedExecutor::new(vec![
        snapshot(ExecutionStatus::Running, "working"),
        snapshot(ExecutionStatus::Failed, "assertion failed"),
        snapshot(ExecutionStatus::Success, "late"),
        snapshot(ExecutionStatus::Running, "stale"),
    ]));

    let execution = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap();

    let stored = wait_for(&h.repository, &execution, |e| e.result.is_completed()).await;
    assert!(stored.result.is_failed());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let later = h.orchestrator.get(execution.id).await.unwrap();
    assert!(later.result.is_failed());
    assert_eq!(later.result.output, "assertion failed");
}

#[tokio::test(start_paused = true)]
async fn test_repeated_get_is_stable() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));
    let execution = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap();
    wait_for(&h.repository, &execution, |e| e.result.is_completed()).await;

    let first = h.orchestrator.get(execution.id).await.unwrap();
    let second = h.orchestrator.get(execution.id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_unnamed_runs_get_generated_names() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));

    let execution = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::default())
        .await
        .unwrap();

    assert_eq!(execution.name.split('-').count(), 3);
    assert_eq!(execution.namespace, "default");
}

#[tokio::test(start_paused = true)]
async fn test_request_validation_and_lookup_failures() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));

    assert_matches!(
        h.orchestrator.execute_run("", RunRequest::new("run-1")).await,
        Err(ExecutionError::Validation(_))
    );
    assert_matches!(
        h.orchestrator
            .execute_run("missing-script", RunRequest::new("run-1"))
            .await,
        Err(ExecutionError::Gateway(msg)) if msg.contains("missing-script")
    );
    assert_eq!(h.executor.execute_calls(), 0);
    assert!(h.repository.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_definition_store_is_a_gateway_error() {
    let h = harness_with_scripts(
        ScriptedExecutor::new(success_after_three_polls()),
        Arc::new(UnavailableStore),
    );

    let result = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await;

    assert_matches!(result, Err(ExecutionError::Gateway(msg)) if msg.contains("connection reset"));
    assert_eq!(h.executor.execute_calls(), 0);
    assert!(h.repository.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_script_without_executor_is_an_internal_error() {
    let scripts = CatalogScriptStore::new().with_script(
        "default",
        "load-test",
        ScriptSpec::inline("k6/script", "export default function() {}"),
    );
    let h = harness_with_scripts(
        ScriptedExecutor::new(success_after_three_polls()),
        Arc::new(scripts),
    );

    let result = h
        .orchestrator
        .execute_run("load-test", RunRequest::new("run-1"))
        .await;

    assert_matches!(result, Err(ExecutionError::Internal(msg)) if msg.contains("k6/script"));
    assert_eq!(h.executor.execute_calls(), 0);
    assert!(h.repository.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_found_at_insert_is_a_conflict() {
    let executor = Arc::new(ScriptedExecutor::new(success_after_three_polls()));
    let records = Arc::new(InMemoryExecutionRepository::new());
    let scripts = CatalogScriptStore::new().with_script(
        "default",
        SCRIPT_ID,
        ScriptSpec::inline(common::SCRIPT_TYPE, "curl -sf http://demo/health"),
    );
    let orchestrator = orchestrator(
        executor.clone(),
        Arc::new(BlindLookupRepository(records.clone())),
        Arc::new(scripts),
    );

    orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap();
    let result = orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await;

    assert_matches!(result, Err(ExecutionError::Conflict { name }) if name == "run-1");
    assert_eq!(executor.execute_calls(), 2);
    assert_eq!(records.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_and_abort() {
    let h = harness(ScriptedExecutor::new(success_after_three_polls()));
    for name in ["run-1", "run-2"] {
        h.orchestrator
            .execute_run(SCRIPT_ID, RunRequest::new(name))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let by_script = h.orchestrator.list_by_script(SCRIPT_ID).await.unwrap();
    assert_eq!(by_script.len(), 2);
    assert_eq!(h.orchestrator.list_newest(1).await.unwrap().len(), 1);

    let id = by_script[0].id;
    assert_matches!(
        h.orchestrator.abort(id).await,
        Err(ExecutionError::NotImplemented(_))
    );
    assert_matches!(
        h.orchestrator.abort(uuid::Uuid::new_v4()).await,
        Err(ExecutionError::NotFound(_))
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_watchers_and_keeps_state() {
    let h = harness(ScriptedExecutor::new(vec![snapshot(
        ExecutionStatus::Running,
        "working",
    )]));
    let execution = h
        .orchestrator
        .execute_run(SCRIPT_ID, RunRequest::new("run-1"))
        .await
        .unwrap();
    wait_for(&h.repository, &execution, |e| e.result.is_running()).await;
    assert_eq!(h.orchestrator.watchers().active(), 1);

    h.orchestrator.shutdown().await;

    assert_eq!(h.orchestrator.watchers().active(), 0);
    let stored = h.repository.get(execution.id).await.unwrap();
    assert!(stored.result.is_running());
    assert_matches!(
        h.orchestrator
            .execute_run(SCRIPT_ID, RunRequest::new("run-2"))
            .await,
        Err(ExecutionError::Internal(_))
    );
}
