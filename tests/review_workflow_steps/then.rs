//! Then steps for review workflow BDD scenarios.

use super::world::{ReviewWorkflowWorld, run_async};
use phaseboard::workflow::{domain::TaskStatus, ports::TaskRepository, services::WorkflowError};
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ReviewWorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = run_async(world.engine.get_task(world.task()?.id()))?;

    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then("the task has {count:u32} review iterations")]
fn task_has_iterations(world: &ReviewWorkflowWorld, count: u32) -> Result<(), eyre::Report> {
    let found = world.task()?.review_iterations();
    if found != count {
        return Err(eyre::eyre!("expected {count} review iterations, found {found}"));
    }
    Ok(())
}

#[then("the task has {count:u32} follow-up subtasks")]
fn task_has_subtasks(world: &ReviewWorkflowWorld, count: u32) -> Result<(), eyre::Report> {
    let subtasks = run_async(world.tasks.find_by_parent(world.task()?.id()))?;
    if u32::try_from(subtasks.len())? != count {
        return Err(eyre::eyre!(
            "expected {count} follow-up subtasks, found {}",
            subtasks.len()
        ));
    }
    if let Some(subtask) = subtasks.iter().find(|s| !s.title().starts_with("Fix: ")) {
        return Err(eyre::eyre!("unexpected subtask title {:?}", subtask.title()));
    }
    Ok(())
}

#[then("manual intervention is required")]
fn intervention_required(world: &ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let forced = task
        .review_feedback()
        .is_some_and(|feedback| feedback.forced_intervention && feedback.requires_intervention());
    if !forced {
        return Err(eyre::eyre!(
            "expected forced intervention, found {:?}",
            task.review_feedback()
        ));
    }
    Ok(())
}

#[then("the review iteration count is unchanged")]
fn iterations_unchanged(world: &ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let before = world
        .iterations_before
        .ok_or_else(|| eyre::eyre!("missing iteration count before rejection"))?;
    let after = world.task()?.review_iterations();
    if before != after {
        return Err(eyre::eyre!("review iterations changed from {before} to {after}"));
    }
    Ok(())
}

#[then("the last request succeeded")]
fn last_request_succeeded(world: &ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(_)) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected success, got {err}")),
        None => Err(eyre::eyre!("missing request result")),
    }
}

#[then("the transition is rejected")]
fn transition_rejected(world: &ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing request result"))?;
    if !matches!(result, Err(WorkflowError::InvalidTransition(_))) {
        return Err(eyre::eyre!("expected InvalidTransition error, got {result:?}"));
    }
    Ok(())
}
