//! In-memory integration tests driving the workflow through the public API.

use std::sync::Arc;

use mockable::DefaultClock;
use phaseboard::workflow::{
    adapters::{
        BroadcastEventBus, PublishedEvent, RepositorySubtaskCreator,
        memory::{
            InMemoryTaskRepository, InMemoryWorkflowConfigRepository, RecordingReviewSubmitter,
        },
    },
    domain::{ProjectId, ReviewVerdict, TaskStatus, UserId, WorkflowConfigPatch},
    ports::TaskRepository,
    services::{WorkflowConfigResolver, WorkflowEngine},
};
use rstest::{fixture, rstest};
use tokio::sync::broadcast::{Receiver, error::TryRecvError};

type BroadcastEngine = WorkflowEngine<
    InMemoryTaskRepository,
    InMemoryWorkflowConfigRepository,
    RecordingReviewSubmitter,
    RepositorySubtaskCreator<InMemoryTaskRepository, DefaultClock>,
    BroadcastEventBus,
    DefaultClock,
>;

struct Setup {
    engine: BroadcastEngine,
    tasks: Arc<InMemoryTaskRepository>,
    reviewer: Arc<RecordingReviewSubmitter>,
    events: Receiver<PublishedEvent>,
}

#[fixture]
fn setup() -> Setup {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let reviewer = Arc::new(RecordingReviewSubmitter::new());
    let bus = Arc::new(BroadcastEventBus::new(64));
    let events = bus.subscribe();
    let clock = Arc::new(DefaultClock);
    let engine = WorkflowEngine::new(
        Arc::clone(&tasks),
        WorkflowConfigResolver::new(Arc::new(InMemoryWorkflowConfigRepository::new())),
        Arc::clone(&reviewer),
        Arc::new(RepositorySubtaskCreator::new(Arc::clone(&tasks), Arc::clone(&clock))),
        bus,
        clock,
    );
    Setup {
        engine,
        tasks,
        reviewer,
        events,
    }
}

fn drain(events: &mut Receiver<PublishedEvent>) -> eyre::Result<Vec<String>> {
    let mut names = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => names.push(event.name),
            Err(TryRecvError::Empty) => return Ok(names),
            Err(err) => return Err(eyre::eyre!("event stream broken: {err}")),
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_review_cycle_with_human_approval(mut setup: Setup) -> eyre::Result<()> {
    let project_id = ProjectId::new();
    let developer = UserId::new();
    let lead = UserId::new();
    setup
        .engine
        .update_config(
            project_id,
            &WorkflowConfigPatch::new()
                .with_enable_human_review(true)
                .with_review_prompt_template("Review {{ title }}: {{ description }}"),
        )
        .await?;

    let task = setup
        .engine
        .create_task(project_id, "Cache config", Some("Add a cache".to_owned()))
        .await?;
    for target in [TaskStatus::InProgress, TaskStatus::Testing] {
        setup
            .engine
            .request_transition(task.id(), target, developer)
            .await?;
    }
    setup.engine.complete_testing(task.id()).await?;
    setup
        .engine
        .submit_review_verdict(
            task.id(),
            ReviewVerdict::Fail {
                issues: vec!["no eviction".to_owned()],
            },
        )
        .await?;
    setup
        .engine
        .request_transition(task.id(), TaskStatus::Testing, developer)
        .await?;
    setup.engine.complete_testing(task.id()).await?;
    setup
        .engine
        .submit_review_verdict(task.id(), ReviewVerdict::Pass)
        .await?;
    let done = setup.engine.approve_human_review(task.id(), lead).await?;

    eyre::ensure!(done.status() == TaskStatus::Done);
    eyre::ensure!(done.review_iterations() == 1);
    let prompts: Vec<String> = setup
        .reviewer
        .submissions()
        .into_iter()
        .map(|(_, request)| request.prompt)
        .collect();
    eyre::ensure!(prompts == vec!["Review Cache config: Add a cache".to_owned(); 2]);
    let subtasks = setup.tasks.find_by_parent(task.id()).await?;
    eyre::ensure!(subtasks.len() == 1, "one follow-up subtask expected");

    setup.engine.flush_events().await;
    let names = drain(&mut setup.events)?;
    let expected = [
        "task.status_changed",
        "task.status_changed",
        "task.status_changed",
        "task.review_requested",
        "task.status_changed",
        "task.review_verdict_applied",
        "task.status_changed",
        "task.status_changed",
        "task.review_requested",
        "task.status_changed",
        "task.review_verdict_applied",
        "task.status_changed",
        "task.human_review_approved",
    ];
    eyre::ensure!(names == expected, "unexpected event sequence {names:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bypassing_testing_when_allowed(mut setup: Setup) -> eyre::Result<()> {
    let project_id = ProjectId::new();
    let actor = UserId::new();
    setup
        .engine
        .update_config(
            project_id,
            &WorkflowConfigPatch::new().with_testing_requires_manual_exit(false),
        )
        .await?;
    let task = setup.engine.create_task(project_id, "Quick fix", None).await?;
    setup
        .engine
        .request_transition(task.id(), TaskStatus::InProgress, actor)
        .await?;

    let reviewed = setup
        .engine
        .request_transition(task.id(), TaskStatus::InReview, actor)
        .await?;

    eyre::ensure!(reviewed.status() == TaskStatus::InReview);
    eyre::ensure!(reviewed.testing_entered_at().is_none());
    eyre::ensure!(setup.reviewer.submissions().len() == 1);
    setup.engine.flush_events().await;
    let names = drain(&mut setup.events)?;
    eyre::ensure!(names.last().map(String::as_str) == Some("task.review_requested"));
    Ok(())
}
