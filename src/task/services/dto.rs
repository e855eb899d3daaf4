//! Wire payloads of the tasks request patterns.
//!
//! All fields are camelCase on the wire. Request payloads are also
//! serializable so the gateway can build them; responses are also
//! deserializable so the gateway can read them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CreateTaskRequest;
use crate::task::domain::{
    Comment, CommentId, HistoryAction, HistoryEntry, HistoryEntryId, ListQuery, Pagination, Task,
    TaskFilter, TaskId, TaskPatch, TaskPriority, TaskStatus, UserId,
};

/// Payload of `tasks.task.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    /// Acting user.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional due date, RFC 3339 or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// Assignees.
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
}

impl CreateTaskPayload {
    /// Converts the payload into a mutator request.
    #[must_use]
    pub fn into_request(self) -> CreateTaskRequest {
        let mut request = CreateTaskRequest::new(self.title).with_assignees(self.assignee_ids);
        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        if let Some(due_date) = self.due_date {
            request = request.with_due_date(due_date);
        }
        if let Some(priority) = self.priority {
            request = request.with_priority(priority);
        }
        request
    }
}

/// Payload of `tasks.task.update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    /// Task to update.
    pub id: TaskId,
    /// Acting user.
    pub user_id: UserId,
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New assignee set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<UserId>>,
}

impl UpdateTaskPayload {
    /// Extracts the partial update.
    #[must_use]
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.clone(),
            priority: self.priority,
            status: self.status,
            assignee_ids: self.assignee_ids.clone(),
        }
    }
}

/// Payload of `tasks.task.delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskPayload {
    /// Task to delete.
    pub task_id: TaskId,
    /// Acting user.
    pub user_id: UserId,
}

/// Payload of `tasks.task.get_by_user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksByUserPayload {
    /// Creator to list for.
    pub user_id: UserId,
    /// Optional status filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Optional priority filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

impl TasksByUserPayload {
    /// Returns the status and priority filter.
    #[must_use]
    pub const fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Payload of `tasks.task.update_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    /// Task to update.
    pub task_id: TaskId,
    /// Status to set.
    pub status: TaskStatus,
    /// Acting user.
    pub user_id: UserId,
}

/// Payload of `tasks.comment.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentPayload {
    /// Task to comment on.
    pub task_id: TaskId,
    /// Author.
    pub user_id: UserId,
    /// Comment text.
    pub content: String,
}

/// Payload of `tasks.task.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksPayload {
    /// One-based page; clamped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Page size; clamped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    /// Search term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Status filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Priority filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

impl ListTasksPayload {
    /// Builds the clamped listing query.
    #[must_use]
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            filter: TaskFilter {
                status: self.status,
                priority: self.priority,
            },
            search: self.search.clone(),
            pagination: Pagination::new(self.page, self.page_size),
        }
    }
}

/// Task id sent either bare or wrapped as `{"taskId": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskIdPayload {
    /// Bare id string.
    Bare(TaskId),
    /// Wrapped id.
    Wrapped {
        /// Task id.
        #[serde(rename = "taskId", alias = "id")]
        task_id: TaskId,
    },
}

impl TaskIdPayload {
    /// Returns the carried id.
    #[must_use]
    pub const fn task_id(self) -> TaskId {
        match self {
            Self::Bare(task_id) | Self::Wrapped { task_id } => task_id,
        }
    }
}

/// Task as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    /// Task id.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Priority.
    pub priority: TaskPriority,
    /// Status.
    pub status: TaskStatus,
    /// Creator.
    pub created_by_id: UserId,
    /// Assignees.
    pub assignee_ids: Vec<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Comments, newest first, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentResponse>>,
    /// History, newest first, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryResponse>>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            description: task.description().map(ToOwned::to_owned),
            due_date: task.due_date(),
            priority: task.priority(),
            status: task.status(),
            created_by_id: task.created_by(),
            assignee_ids: task.assignee_ids().to_vec(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
            comments: None,
            history: None,
        }
    }
}

impl TaskResponse {
    /// Attaches comments and history.
    #[must_use]
    pub fn with_details(mut self, comments: &[Comment], history: &[HistoryEntry]) -> Self {
        self.comments = Some(comments.iter().map(CommentResponse::from).collect());
        self.history = Some(history.iter().map(HistoryResponse::from).collect());
        self
    }
}

/// Comment as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    /// Comment id.
    pub id: CommentId,
    /// Owning task.
    pub task_id: TaskId,
    /// Author.
    pub author_id: UserId,
    /// Text.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id(),
            task_id: comment.task_id(),
            author_id: comment.author_id(),
            content: comment.content().to_owned(),
            created_at: comment.created_at(),
        }
    }
}

/// History entry as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    /// Entry id.
    pub id: HistoryEntryId,
    /// Owning task.
    pub task_id: TaskId,
    /// Recorded action.
    pub action: HistoryAction,
    /// Change metadata.
    pub metadata: Option<Value>,
    /// Performer.
    pub performed_by_id: Option<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&HistoryEntry> for HistoryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id(),
            task_id: entry.task_id(),
            action: entry.action(),
            metadata: entry.metadata().cloned(),
            performed_by_id: entry.performed_by(),
            created_at: entry.created_at(),
        }
    }
}
