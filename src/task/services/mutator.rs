//! Task mutation service: validate, diff, persist, record, publish.

use crate::broker::{
    domain::{DomainEvent, RoutingKey},
    ports::EventPublisher,
};
use crate::task::{
    domain::{
        Comment, CommentContent, CommentCreatedEvent, HistoryAction, HistoryEntry, ListQuery,
        Page, Task, TaskChange, TaskCreatedEvent, TaskFilter, TaskId, TaskPatch, TaskPriority,
        TaskStatus, TaskTitle, TaskUpdatedEvent, TaskValidationError, UserId, parse_due_date,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use super::HistoryRecorder;

/// Input for [`TaskMutator::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<TaskPriority>,
    assignee_ids: Vec<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the unparsed due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Sets the priority; `medium` when never set.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the assignees. Duplicates are dropped on creation.
    #[must_use]
    pub fn with_assignees(mut self, assignee_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.assignee_ids = assignee_ids.into_iter().collect();
        self
    }
}

/// Errors surfaced by [`TaskMutator`].
#[derive(Debug, Error)]
pub enum TaskMutationError {
    /// Input was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] TaskValidationError),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The backing store failed.
    #[error(transparent)]
    Storage(TaskRepositoryError),
}

impl From<TaskRepositoryError> for TaskMutationError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::NotFound(id),
            TaskRepositoryError::Persistence(_) => Self::Storage(err),
        }
    }
}

/// Result type for task mutation operations.
pub type TaskMutationResult<T> = Result<T, TaskMutationError>;

/// Applies task mutations as single units of work.
///
/// Each mutation writes the task change and its history entries in one
/// repository call and, once that commits, publishes exactly one event.
/// Publishing never fails a mutation.
pub struct TaskMutator<R, P, C>
where
    R: TaskRepository,
    P: EventPublisher + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    publisher: Arc<P>,
    clock: Arc<C>,
    history: HistoryRecorder<R, C>,
}

impl<R, P, C> TaskMutator<R, P, C>
where
    R: TaskRepository,
    P: EventPublisher + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a mutator.
    #[must_use]
    pub fn new(repository: Arc<R>, publisher: Arc<P>, clock: Arc<C>) -> Self {
        let history = HistoryRecorder::new(Arc::clone(&repository), Arc::clone(&clock));
        Self {
            repository,
            publisher,
            clock,
            history,
        }
    }

    /// Returns the history recorder sharing this mutator's repository.
    #[must_use]
    pub const fn history_recorder(&self) -> &HistoryRecorder<R, C> {
        &self.history
    }

    /// Creates a task with status `todo`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Validation`] for a bad title or due date
    /// and [`TaskMutationError::Storage`] when the write fails.
    pub async fn create(
        &self,
        author: UserId,
        request: CreateTaskRequest,
    ) -> TaskMutationResult<Task> {
        let title = TaskTitle::new(&request.title)?;
        let due_date = request.due_date.as_deref().map(parse_due_date).transpose()?;

        let mut task = Task::new(title, author, &*self.clock)
            .with_priority(request.priority.unwrap_or_default())
            .with_assignees(request.assignee_ids);
        if let Some(description) = request.description {
            task = task.with_description(description);
        }
        if let Some(due) = due_date {
            task = task.with_due_date(due);
        }

        let entry = self.history.stage(
            task.id(),
            HistoryAction::TaskCreated,
            Some(json!({ "title": task.title() })),
            Some(author),
        );
        self.repository.insert(&task, &entry).await?;
        tracing::info!(task_id = %task.id(), %author, "task created");

        self.publish(RoutingKey::TaskCreated, &TaskCreatedEvent::from_task(&task))
            .await;
        Ok(task)
    }

    /// Applies a partial update.
    ///
    /// One history entry is written per changed field. When nothing
    /// changed, nothing is written or published and the stored task is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task,
    /// [`TaskMutationError::Validation`] for a bad title or due date, and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn update(
        &self,
        task_id: TaskId,
        author: UserId,
        patch: TaskPatch,
    ) -> TaskMutationResult<Task> {
        let mut task = self.load(task_id).await?;
        let changes = task.apply_patch(&patch, &*self.clock)?;
        if changes.is_empty() {
            tracing::debug!(%task_id, "update changed nothing");
            return Ok(task);
        }

        let entries: Vec<HistoryEntry> = changes
            .iter()
            .map(|change| {
                self.history
                    .stage(task_id, change.action(), Some(change.metadata()), Some(author))
            })
            .collect();
        self.repository.save(&task, &entries).await?;
        tracing::info!(%task_id, %author, changes = changes.len(), "task updated");

        let actions = changes.iter().map(TaskChange::action).collect();
        let mut event = TaskUpdatedEvent::from_task(&task, actions);
        if let Some((old, new)) = changes.iter().find_map(|change| match change {
            TaskChange::Status { old, new } => Some((*old, *new)),
            _ => None,
        }) {
            event = event.with_status_change(old, new);
        }
        self.publish(RoutingKey::TaskUpdated, &event).await;
        Ok(task)
    }

    /// Sets the status, recording and publishing even when it is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        author: UserId,
    ) -> TaskMutationResult<Task> {
        let mut task = self.load(task_id).await?;
        let old = task.set_status(status, &*self.clock);
        let change = TaskChange::Status { old, new: status };
        let entry = self.history.stage(
            task_id,
            change.action(),
            Some(change.metadata()),
            Some(author),
        );
        self.repository.save(&task, &[entry]).await?;
        tracing::info!(%task_id, %author, from = %old, to = %status, "task status set");

        let event = TaskUpdatedEvent::from_task(&task, vec![change.action()])
            .with_status_change(old, status);
        self.publish(RoutingKey::TaskUpdated, &event).await;
        Ok(task)
    }

    /// Deletes a task with its assignees, comments, and history.
    ///
    /// No event is published.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn remove(&self, task_id: TaskId) -> TaskMutationResult<()> {
        self.repository.delete(task_id).await?;
        tracing::info!(%task_id, "task deleted");
        Ok(())
    }

    /// Adds a comment to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task,
    /// [`TaskMutationError::Validation`] for blank or oversized content, and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn add_comment(
        &self,
        task_id: TaskId,
        author: UserId,
        content: impl Into<String> + Send,
    ) -> TaskMutationResult<Comment> {
        let task = self.load(task_id).await?;
        let body = CommentContent::new(content)?;
        let comment = Comment::new(task_id, author, body, &*self.clock);
        let entry = self.history.stage(
            task_id,
            HistoryAction::CommentCreated,
            Some(json!({ "commentId": comment.id() })),
            Some(author),
        );
        self.repository.insert_comment(&comment, &entry).await?;
        tracing::info!(%task_id, comment_id = %comment.id(), %author, "comment added");

        let event = CommentCreatedEvent {
            task_id,
            comment_id: comment.id(),
            author_id: author,
            title: task.title().to_owned(),
            assignee_ids: task.assignee_ids().to_vec(),
        };
        self.publish(RoutingKey::CommentNew, &event).await;
        Ok(comment)
    }

    /// Returns one task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn get(&self, task_id: TaskId) -> TaskMutationResult<Task> {
        self.load(task_id).await
    }

    /// Returns every task, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] when storage fails.
    pub async fn list_all(&self) -> TaskMutationResult<Vec<Task>> {
        Ok(self.repository.find_all().await?)
    }

    /// Returns tasks created by `user` that pass `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] when storage fails.
    pub async fn list_by_user(
        &self,
        user: UserId,
        filter: TaskFilter,
    ) -> TaskMutationResult<Vec<Task>> {
        Ok(self.repository.find_by_creator(user, filter).await?)
    }

    /// Returns one filtered, searched page of tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::Storage`] when storage fails.
    pub async fn list(&self, query: &ListQuery) -> TaskMutationResult<Page<Task>> {
        Ok(self.repository.list(query).await?)
    }

    /// Returns the comments of a task, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn comments(&self, task_id: TaskId) -> TaskMutationResult<Vec<Comment>> {
        self.load(task_id).await?;
        Ok(self.repository.comments(task_id).await?)
    }

    /// Returns the history of a task, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskMutationError::NotFound`] for an unknown task and
    /// [`TaskMutationError::Storage`] when storage fails.
    pub async fn history(&self, task_id: TaskId) -> TaskMutationResult<Vec<HistoryEntry>> {
        self.load(task_id).await?;
        Ok(self.repository.history(task_id).await?)
    }

    async fn load(&self, task_id: TaskId) -> TaskMutationResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskMutationError::NotFound(task_id))
    }

    async fn publish(&self, routing_key: RoutingKey, body: &impl Serialize) {
        let payload = match serde_json::to_value(body) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%routing_key, error = %err, "event payload not serializable");
                return;
            }
        };
        let event = DomainEvent::new(routing_key, payload, &*self.clock);
        self.publisher.publish(&event).await;
    }
}
