//! Repository port for task, comment, and history persistence.

use crate::task::domain::{
    Comment, HistoryEntry, ListQuery, Page, Task, TaskFilter, TaskId, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every write method is one unit of work: either the task change and all
/// accompanying history entries are stored, or nothing is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task, its assignees, and its creation entry.
    async fn insert(&self, task: &Task, entry: &HistoryEntry) -> TaskRepositoryResult<()>;

    /// Persists the current state of an existing task, replaces its
    /// assignee links, and appends `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn save(&self, task: &Task, entries: &[HistoryEntry]) -> TaskRepositoryResult<()>;

    /// Deletes a task together with its assignees, comments, and history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Stores a comment and its history entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn insert_comment(&self, comment: &Comment, entry: &HistoryEntry)
    -> TaskRepositoryResult<()>;

    /// Appends one history entry outside any other write.
    async fn append_history(&self, entry: &HistoryEntry) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns one page of tasks matching `query`, newest first.
    async fn list(&self, query: &ListQuery) -> TaskRepositoryResult<Page<Task>>;

    /// Returns every task created by `user` that passes `filter`, newest
    /// first.
    async fn find_by_creator(
        &self,
        user: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task, newest first.
    async fn find_all(&self) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the comments of a task, newest first.
    async fn comments(&self, id: TaskId) -> TaskRepositoryResult<Vec<Comment>>;

    /// Returns the history of a task, newest first.
    async fn history(&self, id: TaskId) -> TaskRepositoryResult<Vec<HistoryEntry>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
