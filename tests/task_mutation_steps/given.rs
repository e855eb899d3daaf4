//! Given steps for task mutation BDD scenarios.

use super::world::{MutationWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasktrack::task::services::CreateTaskRequest;

#[given(r#"user "{name}" has created a task titled "{title}""#)]
fn user_has_created_task(
    world: &mut MutationWorld,
    name: String,
    title: String,
) -> Result<(), eyre::Report> {
    let author = world.user(&name);
    let task = run_async(world.mutator.create(author, CreateTaskRequest::new(title)))
        .wrap_err("create task for scenario setup")?;
    world.task = Some(task);
    Ok(())
}
