//! Payloads of the domain events the task service publishes.

use super::{CommentId, HistoryAction, Task, TaskId, TaskStatus, UserId};
use serde::{Deserialize, Serialize};

/// Body of `task:created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreatedEvent {
    /// Created task.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Assignees at creation.
    pub assignee_ids: Vec<UserId>,
}

impl TaskCreatedEvent {
    /// Describes a freshly created task.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            assignee_ids: task.assignee_ids().to_vec(),
        }
    }
}

/// Body of `task:updated`.
///
/// `oldStatus`/`newStatus` are present whenever the mutation touched the
/// status, so consumers can detect status changes from either update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatedEvent {
    /// Updated task.
    pub id: TaskId,
    /// Title after the update.
    pub title: String,
    /// Assignees after the update.
    pub assignee_ids: Vec<UserId>,
    /// Actions recorded by the update, one per changed field.
    pub actions: Vec<HistoryAction>,
    /// Status before the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<TaskStatus>,
    /// Status after the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<TaskStatus>,
}

impl TaskUpdatedEvent {
    /// Describes an updated task with the actions that were recorded.
    #[must_use]
    pub fn from_task(task: &Task, actions: Vec<HistoryAction>) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            assignee_ids: task.assignee_ids().to_vec(),
            actions,
            old_status: None,
            new_status: None,
        }
    }

    /// Adds the status transition.
    #[must_use]
    pub const fn with_status_change(mut self, old: TaskStatus, new: TaskStatus) -> Self {
        self.old_status = Some(old);
        self.new_status = Some(new);
        self
    }
}

/// Body of `comment:new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreatedEvent {
    /// Commented task.
    pub task_id: TaskId,
    /// New comment.
    pub comment_id: CommentId,
    /// Comment author.
    pub author_id: UserId,
    /// Task title.
    pub title: String,
    /// Task assignees.
    pub assignee_ids: Vec<UserId>,
}
