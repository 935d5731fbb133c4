#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use runway_core::domain::execution::{Execution, ExecutionResult, ExecutionStatus};
use runway_core::domain::script::ScriptSpec;
use runway_core::dto::execution::{BackendExecution, ExecuteOptions};
use runway_orchestrator::definitions::{CatalogScriptStore, DefinitionError, ScriptStore};
use runway_orchestrator::executor::{
    DispatchError, ExecutorClient, ExecutorRegistry, UpdateHandler, WatchError,
};
use runway_orchestrator::repository::{
    ExecutionRepository, InMemoryExecutionRepository, RepositoryError,
};
use runway_orchestrator::service::Orchestrator;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const SCRIPT_TYPE: &str = "curl/test";
pub const SCRIPT_ID: &str = "demo-script";

pub fn snapshot(status: ExecutionStatus, output: &str) -> ExecutionResult {
    ExecutionResult {
        status,
        output: output.to_string(),
        ..Default::default()
    }
}

/// Executor double that replays a fixed list of snapshots, one per poll
///
/// Snapshots are delivered unfiltered so tests can check what the
/// orchestrator does with repeats and late updates.
pub struct ScriptedExecutor {
    snapshots: Vec<ExecutionResult>,
    poll_interval: Duration,
    fail_dispatch: bool,
    execute_calls: AtomicUsize,
    options: std::sync::Mutex<Vec<ExecuteOptions>>,
}

impl ScriptedExecutor {
    pub fn new(snapshots: Vec<ExecutionResult>) -> Self {
        Self {
            snapshots,
            poll_interval: Duration::from_millis(100),
            fail_dispatch: false,
            execute_calls: AtomicUsize::new(0),
            options: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_dispatch: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ExecuteOptions> {
        self.options.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ExecutorClient for ScriptedExecutor {
    async fn execute(&self, options: &ExecuteOptions) -> Result<BackendExecution, DispatchError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options.clone());

        if self.fail_dispatch {
            return Err(DispatchError::Unreachable(
                "connection refused".to_string(),
            ));
        }

        Ok(BackendExecution {
            id: format!("backend-{}", self.execute_calls()),
            result: snapshot(ExecutionStatus::Queued, ""),
        })
    }

    async fn watch(
        &self,
        _backend_id: &str,
        handler: &mut dyn UpdateHandler,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, WatchError> {
        let mut finished = None;
        for next in &self.snapshots {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WatchError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
            handler.on_update(next).await.map_err(WatchError::Handler)?;
            if finished.is_none() && next.is_completed() {
                finished = Some(next.clone());
            }
        }

        match finished {
            Some(result) => Ok(result),
            None => {
                // A backend that never finishes keeps the watch open until cancelled
                cancel.cancelled().await;
                Err(WatchError::Cancelled)
            }
        }
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub repository: Arc<InMemoryExecutionRepository>,
    pub executor: Arc<ScriptedExecutor>,
}

pub fn harness(executor: ScriptedExecutor) -> Harness {
    let scripts = CatalogScriptStore::new().with_script(
        "default",
        SCRIPT_ID,
        ScriptSpec::inline(SCRIPT_TYPE, "curl -sf http://demo/health"),
    );
    harness_with_scripts(executor, Arc::new(scripts))
}

/// Harness resolving definitions from `scripts` instead of the demo catalog
pub fn harness_with_scripts(executor: ScriptedExecutor, scripts: Arc<dyn ScriptStore>) -> Harness {
    let executor = Arc::new(executor);
    let repository = Arc::new(InMemoryExecutionRepository::new());
    let orchestrator = orchestrator(
        executor.clone(),
        repository.clone() as Arc<dyn ExecutionRepository>,
        scripts,
    );

    Harness {
        orchestrator,
        repository,
        executor,
    }
}

/// Orchestrator with `executor` registered for [`SCRIPT_TYPE`]
pub fn orchestrator(
    executor: Arc<ScriptedExecutor>,
    repository: Arc<dyn ExecutionRepository>,
    scripts: Arc<dyn ScriptStore>,
) -> Orchestrator {
    let mut registry = ExecutorRegistry::new();
    registry
        .register(SCRIPT_TYPE, executor as Arc<dyn ExecutorClient>)
        .unwrap();

    Orchestrator::new(repository, scripts, registry)
}

/// Definition store that is always down
pub struct UnavailableStore;

#[async_trait]
impl ScriptStore for UnavailableStore {
    async fn get(&self, _namespace: &str, _id: &str) -> Result<ScriptSpec, DefinitionError> {
        Err(DefinitionError::Unavailable("connection reset".to_string()))
    }
}

/// Repository whose name lookup never finds anything
///
/// Lets two runs with the same name both pass the conflict check, as two
/// concurrent requests can.
pub struct BlindLookupRepository(pub Arc<InMemoryExecutionRepository>);

#[async_trait]
impl ExecutionRepository for BlindLookupRepository {
    async fn insert(&self, execution: &Execution) -> Result<(), RepositoryError> {
        self.0.insert(execution).await
    }

    async fn update(&self, execution: &Execution) -> Result<(), RepositoryError> {
        self.0.update(execution).await
    }

    async fn get(&self, id: Uuid) -> Result<Execution, RepositoryError> {
        self.0.get(id).await
    }

    async fn find_by_name_and_script(
        &self,
        _name: &str,
        _script_id: &str,
    ) -> Result<Option<Execution>, RepositoryError> {
        Ok(None)
    }

    async fn list_by_script(&self, script_id: &str) -> Result<Vec<Execution>, RepositoryError> {
        self.0.list_by_script(script_id).await
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<Execution>, RepositoryError> {
        self.0.list_newest(limit).await
    }
}

/// Waits until the stored record satisfies `done`
pub async fn wait_for(
    repository: &InMemoryExecutionRepository,
    execution: &Execution,
    done: impl Fn(&Execution) -> bool,
) -> Execution {
    for _ in 0..500 {
        let current = repository.get(execution.id).await.unwrap();
        if done(&current) {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("execution {} never reached the expected state", execution.id);
}
