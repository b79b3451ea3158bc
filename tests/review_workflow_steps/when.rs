//! When steps for review workflow BDD scenarios.

use super::world::{ReviewWorkflowWorld, run_async};
use eyre::WrapErr;
use phaseboard::workflow::domain::{ReviewVerdict, TaskStatus};
use rstest_bdd_macros::when;

#[when(r#"the reviewer fails the task with issue "{issue}""#)]
fn reviewer_fails_task(world: &mut ReviewWorkflowWorld, issue: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let verdict = ReviewVerdict::Fail {
        issues: vec![issue],
    };
    let result = run_async(world.engine.submit_review_verdict(task_id, verdict));
    world.record(result);
    Ok(())
}

#[when("the reviewer passes the task")]
fn reviewer_passes_task(world: &mut ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .engine
            .submit_review_verdict(task_id, ReviewVerdict::Pass),
    );
    world.record(result);
    Ok(())
}

#[when("the task goes back through testing into automated review")]
fn back_into_review(world: &mut ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    run_async(
        world
            .engine
            .request_transition(task_id, TaskStatus::Testing, world.actor),
    )
    .wrap_err("move task back to testing")?;
    let result = run_async(world.engine.complete_testing(task_id));
    world.record(result);
    Ok(())
}

#[when(r#"the task is moved to "{status}""#)]
fn task_moved_to(world: &mut ReviewWorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task_id = world.task()?.id();
    let result = run_async(world.engine.request_transition(task_id, target, world.actor));
    world.record(result);
    Ok(())
}

#[when(r#"a human rejects the task because "{reason}""#)]
fn human_rejects_task(world: &mut ReviewWorkflowWorld, reason: String) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let task_id = task.id();
    let iterations = task.review_iterations();
    world.iterations_before = Some(iterations);
    let result = run_async(
        world
            .engine
            .reject_human_review(task_id, world.actor, &reason),
    );
    world.record(result);
    Ok(())
}
