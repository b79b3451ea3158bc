//! Shared world state for review workflow BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use phaseboard::workflow::{
    adapters::{
        RepositorySubtaskCreator,
        memory::{
            InMemoryTaskRepository, InMemoryWorkflowConfigRepository, RecordingEventBus,
            RecordingReviewSubmitter,
        },
    },
    domain::{ProjectId, Task, UserId},
    services::{WorkflowConfigResolver, WorkflowEngine, WorkflowError},
};
use rstest::fixture;

/// Engine type used by the BDD world.
pub type TestEngine = WorkflowEngine<
    InMemoryTaskRepository,
    InMemoryWorkflowConfigRepository,
    RecordingReviewSubmitter,
    RepositorySubtaskCreator<InMemoryTaskRepository, DefaultClock>,
    RecordingEventBus,
    DefaultClock,
>;

/// Scenario world for review workflow behaviour tests.
pub struct ReviewWorkflowWorld {
    pub engine: TestEngine,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub project_id: ProjectId,
    pub actor: UserId,
    pub task: Option<Task>,
    pub iterations_before: Option<u32>,
    pub last_result: Option<Result<Task, WorkflowError>>,
}

impl ReviewWorkflowWorld {
    /// Creates a world with a fresh engine and no task.
    #[must_use]
    pub fn new() -> Self {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let clock = Arc::new(DefaultClock);
        let engine = WorkflowEngine::new(
            Arc::clone(&tasks),
            WorkflowConfigResolver::new(Arc::new(InMemoryWorkflowConfigRepository::new())),
            Arc::new(RecordingReviewSubmitter::new()),
            Arc::new(RepositorySubtaskCreator::new(
                Arc::clone(&tasks),
                Arc::clone(&clock),
            )),
            Arc::new(RecordingEventBus::new()),
            clock,
        );

        Self {
            engine,
            tasks,
            project_id: ProjectId::new(),
            actor: UserId::new(),
            task: None,
            iterations_before: None,
            last_result: None,
        }
    }

    /// Returns the scenario task.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Records `result`, keeping the latest successful task state.
    pub fn record(&mut self, result: Result<Task, WorkflowError>) {
        if let Ok(ref updated) = result {
            self.task = Some(updated.clone());
        }
        self.last_result = Some(result);
    }
}

impl Default for ReviewWorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReviewWorkflowWorld {
    ReviewWorkflowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
