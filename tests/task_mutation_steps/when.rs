//! When steps for task mutation BDD scenarios.

use super::world::{MutationWorld, run_async};
use rstest_bdd_macros::when;
use tasktrack::task::domain::{TaskId, TaskPatch, TaskStatus};
use tasktrack::task::services::CreateTaskRequest;

#[when(r#"user "{name}" creates a task titled "{title}" assigned to "{assignee}""#)]
fn user_creates_task(world: &mut MutationWorld, name: String, title: String, assignee: String) {
    let author = world.user(&name);
    let assignee_id = world.user(&assignee);
    let outcome = run_async(world.mutator.create(
        author,
        CreateTaskRequest::new(title).with_assignees([assignee_id]),
    ));
    world.record(outcome, Some);
}

#[when(r#"user "{name}" sets the status to "{status}""#)]
fn user_sets_status(
    world: &mut MutationWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let author = world.user(&name);
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task_id = world.task()?.id();
    let outcome = run_async(world.mutator.update_status(task_id, target, author));
    world.record(outcome, Some);
    Ok(())
}

#[when(r#"user "{name}" renames the task to "{title}""#)]
fn user_renames_task(
    world: &mut MutationWorld,
    name: String,
    title: String,
) -> Result<(), eyre::Report> {
    let author = world.user(&name);
    let task_id = world.task()?.id();
    let patch = TaskPatch {
        title: Some(title),
        ..TaskPatch::default()
    };
    let outcome = run_async(world.mutator.update(task_id, author, patch));
    world.record(outcome, Some);
    Ok(())
}

#[when(r#"user "{name}" comments "{content}" on an unknown task"#)]
fn user_comments_on_unknown_task(world: &mut MutationWorld, name: String, content: String) {
    let author = world.user(&name);
    let outcome = run_async(world.mutator.add_comment(TaskId::new(), author, content));
    world.record(outcome, |_| None);
}
