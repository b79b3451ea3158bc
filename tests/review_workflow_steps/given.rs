//! Given steps for review workflow BDD scenarios.

use super::world::{ReviewWorkflowWorld, run_async};
use eyre::WrapErr;
use phaseboard::workflow::domain::{TaskStatus, WorkflowConfigPatch};
use rstest_bdd_macros::given;

fn configure(world: &ReviewWorkflowWorld, patch: &WorkflowConfigPatch) -> Result<(), eyre::Report> {
    run_async(world.engine.update_config(world.project_id, patch))
        .wrap_err("update workflow configuration")?;
    Ok(())
}

#[given("a project with the default workflow")]
fn default_workflow(world: &mut ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let config = run_async(world.engine.get_effective_config(world.project_id))
        .wrap_err("resolve default configuration")?;
    if config.enable_human_review || !config.testing_requires_manual_exit {
        return Err(eyre::eyre!("unexpected default configuration {config:?}"));
    }
    Ok(())
}

#[given("a project whose workflow allows {count:u32} review iterations")]
fn workflow_with_iteration_cap(
    world: &mut ReviewWorkflowWorld,
    count: u32,
) -> Result<(), eyre::Report> {
    configure(
        world,
        &WorkflowConfigPatch::new().with_max_review_iterations(count),
    )
}

#[given("a project with human review enabled")]
fn workflow_with_human_review(world: &mut ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    configure(world, &WorkflowConfigPatch::new().with_enable_human_review(true))
}

#[given("a new task")]
fn new_task(world: &mut ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    let task = run_async(
        world
            .engine
            .create_task(world.project_id, "Add review workflow", None),
    )
    .wrap_err("create scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given("a task in automated review")]
fn task_in_review(world: &mut ReviewWorkflowWorld) -> Result<(), eyre::Report> {
    new_task(world)?;
    let task_id = world.task()?.id();
    for target in [TaskStatus::InProgress, TaskStatus::Testing] {
        run_async(world.engine.request_transition(task_id, target, world.actor))
            .wrap_err_with(|| format!("move scenario task to {target}"))?;
    }
    let task = run_async(world.engine.complete_testing(task_id))
        .wrap_err("complete testing for scenario task")?;
    world.task = Some(task);
    Ok(())
}
