//! Append-only audit trail entries.

use super::{HistoryEntryId, ParseHistoryActionError, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of change a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryAction {
    /// The task was created.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A plain field changed.
    #[serde(rename = "task.updated")]
    TaskUpdated,
    /// The status changed or was explicitly set.
    #[serde(rename = "task.status_changed")]
    StatusChanged,
    /// The assignee set changed.
    #[serde(rename = "task.assignee_changed")]
    AssigneeChanged,
    /// A comment was added.
    #[serde(rename = "comment.created")]
    CommentCreated,
}

impl HistoryAction {
    const ALL: [Self; 5] = [
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::StatusChanged,
        Self::AssigneeChanged,
        Self::CommentCreated,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::StatusChanged => "task.status_changed",
            Self::AssigneeChanged => "task.assignee_changed",
            Self::CommentCreated => "comment.created",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = ParseHistoryActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ParseHistoryActionError(value.to_owned()))
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: HistoryEntryId,
    task_id: TaskId,
    action: HistoryAction,
    metadata: Option<Value>,
    performed_by: Option<UserId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for building or reconstructing a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedHistoryData {
    /// Entry identifier.
    pub id: HistoryEntryId,
    /// Owning task.
    pub task_id: TaskId,
    /// Recorded action.
    pub action: HistoryAction,
    /// Free-form JSON object describing the change.
    pub metadata: Option<Value>,
    /// User who performed the change.
    pub performed_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Builds an entry from its parts.
    #[must_use]
    pub fn from_persisted(data: PersistedHistoryData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            action: data.action,
            metadata: data.metadata,
            performed_by: data.performed_by,
            created_at: data.created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> HistoryEntryId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the recorded action.
    #[must_use]
    pub const fn action(&self) -> HistoryAction {
        self.action
    }

    /// Returns the metadata, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Returns the performer, if known.
    #[must_use]
    pub const fn performed_by(&self) -> Option<UserId> {
        self.performed_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
