//! Logical request/response patterns exchanged between services.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Named request patterns served by the tasks and notifications services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestPattern {
    /// Create a task.
    TaskCreate,
    /// Fetch one task with comments and history.
    TaskGetById,
    /// Fetch every task.
    TaskGetAll,
    /// Fetch a filtered, paginated page of tasks.
    TaskList,
    /// Apply a partial update.
    TaskUpdate,
    /// Delete a task.
    TaskDelete,
    /// Fetch tasks created by a user.
    TaskGetByUser,
    /// Set the task status.
    TaskUpdateStatus,
    /// Fetch the history trail of a task.
    TaskGetHistory,
    /// Add a comment.
    CommentCreate,
    /// Fetch comments of a task.
    CommentGetByTask,
    /// Fetch a page of notifications for a user.
    NotificationGetByUser,
    /// Fetch one notification of a user.
    NotificationGetById,
    /// Mark one notification as read.
    NotificationMarkAsRead,
    /// Mark every notification of a user as read.
    NotificationMarkAllAsRead,
    /// Delete one notification of a user.
    NotificationDelete,
}

impl RequestPattern {
    /// Every known pattern.
    pub const ALL: [Self; 16] = [
        Self::TaskCreate,
        Self::TaskGetById,
        Self::TaskGetAll,
        Self::TaskList,
        Self::TaskUpdate,
        Self::TaskDelete,
        Self::TaskGetByUser,
        Self::TaskUpdateStatus,
        Self::TaskGetHistory,
        Self::CommentCreate,
        Self::CommentGetByTask,
        Self::NotificationGetByUser,
        Self::NotificationGetById,
        Self::NotificationMarkAsRead,
        Self::NotificationMarkAllAsRead,
        Self::NotificationDelete,
    ];

    /// Returns the wire name of the pattern.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreate => "tasks.task.create",
            Self::TaskGetById => "tasks.task.get_by_id",
            Self::TaskGetAll => "tasks.task.get_all",
            Self::TaskList => "tasks.task.list",
            Self::TaskUpdate => "tasks.task.update",
            Self::TaskDelete => "tasks.task.delete",
            Self::TaskGetByUser => "tasks.task.get_by_user",
            Self::TaskUpdateStatus => "tasks.task.update_status",
            Self::TaskGetHistory => "tasks.task.get_history",
            Self::CommentCreate => "tasks.comment.create",
            Self::CommentGetByTask => "tasks.comment.get_by_task",
            Self::NotificationGetByUser => "notifications.notification.get_by_user",
            Self::NotificationMarkAsRead => "notifications.notification.mark_as_read",
            Self::NotificationGetById => "notifications.notification.get_by_id",
            Self::NotificationMarkAllAsRead => "notifications.notification.mark_all_as_read",
            Self::NotificationDelete => "notifications.notification.delete",
        }
    }

    /// Returns the owning service prefix (`tasks` or `notifications`).
    #[must_use]
    pub fn service(self) -> &'static str {
        self.as_str().split('.').next().unwrap_or_default()
    }

    /// Whether the pattern changes state on the callee.
    ///
    /// Mutating calls surface failures to the caller; reads degrade.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::TaskCreate
                | Self::TaskUpdate
                | Self::TaskDelete
                | Self::TaskUpdateStatus
                | Self::CommentCreate
                | Self::NotificationMarkAsRead
                | Self::NotificationMarkAllAsRead
                | Self::NotificationDelete
        )
    }
}

impl fmt::Display for RequestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a pattern name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown request pattern: {0}")]
pub struct ParsePatternError(pub String);

impl TryFrom<&str> for RequestPattern {
    type Error = ParsePatternError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|pattern| pattern.as_str() == value)
            .ok_or_else(|| ParsePatternError(value.to_owned()))
    }
}
