//! Shared world state for task mutation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasktrack::broker::adapters::memory::InMemoryBroker;
use tasktrack::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Task, UserId},
    services::{TaskMutationError, TaskMutator},
};

/// Mutator type used by the BDD world.
pub type TestMutator = TaskMutator<InMemoryTaskRepository, InMemoryBroker, DefaultClock>;

/// Scenario world for task mutation behaviour tests.
pub struct MutationWorld {
    pub broker: InMemoryBroker,
    pub mutator: TestMutator,
    pub users: HashMap<String, UserId>,
    pub task: Option<Task>,
    pub last_error: Option<TaskMutationError>,
}

impl MutationWorld {
    /// Creates a world with an empty store and broker.
    #[must_use]
    pub fn new() -> Self {
        let broker = InMemoryBroker::new();
        let mutator = TaskMutator::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(broker.clone()),
            Arc::new(DefaultClock),
        );
        Self {
            broker,
            mutator,
            users: HashMap::new(),
            task: None,
            last_error: None,
        }
    }

    /// Returns the identifier for a named user, allocating one on first use.
    pub fn user(&mut self, name: &str) -> UserId {
        *self.users.entry(name.to_owned()).or_default()
    }

    /// Returns the task created by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))
    }

    /// Stores the outcome of a mutation.
    pub fn record<T>(
        &mut self,
        outcome: Result<T, TaskMutationError>,
        keep: impl FnOnce(T) -> Option<Task>,
    ) {
        match outcome {
            Ok(value) => {
                if let Some(task) = keep(value) {
                    self.task = Some(task);
                }
            }
            Err(err) => self.last_error = Some(err),
        }
    }
}

impl Default for MutationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> MutationWorld {
    MutationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
