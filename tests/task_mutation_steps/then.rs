//! Then steps for task mutation BDD scenarios.

use super::world::{MutationWorld, run_async};
use rstest_bdd_macros::then;
use tasktrack::broker::domain::RoutingKey;
use tasktrack::task::{domain::TaskStatus, services::TaskMutationError};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &MutationWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;
    eyre::ensure!(
        task.status() == expected,
        "expected status {expected}, found {}",
        task.status()
    );
    Ok(())
}

#[then("the task history length is {count:usize}")]
fn task_history_length(world: &MutationWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let history = run_async(world.mutator.history(task_id))?;
    eyre::ensure!(
        history.len() == count,
        "expected {count} history entries, found {}",
        history.len()
    );
    Ok(())
}

#[then(r#"the number of "{key}" events is {count:usize}"#)]
fn number_of_events(world: &MutationWorld, key: String, count: usize) -> Result<(), eyre::Report> {
    let routing_key = RoutingKey::try_from(key.as_str())
        .map_err(|err| eyre::eyre!("invalid routing key in scenario: {err}"))?;
    let published = world.broker.published_with(routing_key).len();
    eyre::ensure!(
        published == count,
        "expected {count} {key} events, found {published}"
    );
    Ok(())
}

#[then(r#"the latest "{key}" event reports "{old}" to "{new}""#)]
fn latest_event_reports_transition(
    world: &MutationWorld,
    key: String,
    old: String,
    new: String,
) -> Result<(), eyre::Report> {
    let routing_key = RoutingKey::try_from(key.as_str())
        .map_err(|err| eyre::eyre!("invalid routing key in scenario: {err}"))?;
    let event = world
        .broker
        .published_with(routing_key)
        .pop()
        .ok_or_else(|| eyre::eyre!("no {key} event was published"))?;
    let payload = event.payload();
    eyre::ensure!(
        payload.get("oldStatus").and_then(|value| value.as_str()) == Some(old.as_str()),
        "unexpected oldStatus in {payload}"
    );
    eyre::ensure!(
        payload.get("newStatus").and_then(|value| value.as_str()) == Some(new.as_str()),
        "unexpected newStatus in {payload}"
    );
    Ok(())
}

#[then("the mutation fails with a validation error")]
fn mutation_fails_with_validation(world: &MutationWorld) -> Result<(), eyre::Report> {
    match world.last_error.as_ref() {
        Some(TaskMutationError::Validation(_)) => Ok(()),
        other => Err(eyre::eyre!("expected a validation error, got {other:?}")),
    }
}

#[then("the mutation fails with a not found error")]
fn mutation_fails_with_not_found(world: &MutationWorld) -> Result<(), eyre::Report> {
    match world.last_error.as_ref() {
        Some(TaskMutationError::NotFound(_)) => Ok(()),
        other => Err(eyre::eyre!("expected a not found error, got {other:?}")),
    }
}
