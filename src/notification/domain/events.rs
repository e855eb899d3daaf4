//! Task event payloads as the notification consumer reads them.
//!
//! Decoding is lenient: only the identifiers a notification needs are
//! required, everything else defaults so that producers can add fields
//! without breaking consumers.

use crate::task::domain::{TaskId, UserId};
use serde::Deserialize;

/// Body of `task:created` and `task:updated`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEventPayload {
    /// Affected task.
    pub id: TaskId,
    /// Task title.
    #[serde(default)]
    pub title: String,
    /// Current assignees.
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
    /// Status before an update, when the update touched the status.
    #[serde(default)]
    pub old_status: Option<String>,
    /// Status after an update, when the update touched the status.
    #[serde(default)]
    pub new_status: Option<String>,
}

impl TaskEventPayload {
    /// The new status when the event records an actual status change.
    #[must_use]
    pub fn status_transition(&self) -> Option<&str> {
        let new_status = self.new_status.as_deref()?;
        (self.old_status.as_deref() != Some(new_status)).then_some(new_status)
    }
}

/// Body of `comment:new`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEventPayload {
    /// Commented task.
    pub task_id: TaskId,
    /// Comment author, never notified about their own comment.
    pub author_id: UserId,
    /// Task title.
    #[serde(default)]
    pub title: String,
    /// Task assignees at the time of the comment.
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
}
