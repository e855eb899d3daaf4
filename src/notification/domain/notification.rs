//! Notification records and their deduplication key.

use super::{NotificationId, ParseNotificationTypeError};
use crate::task::domain::{TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Reason a user is being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// The user was assigned to a task.
    TaskAssigned,
    /// A task the user is assigned to changed status.
    TaskUpdated,
    /// Someone commented on a task the user is assigned to.
    CommentAdded,
    /// A task the user is assigned to was completed.
    TaskCompleted,
}

impl NotificationType {
    const ALL: [Self; 4] = [
        Self::TaskAssigned,
        Self::TaskUpdated,
        Self::CommentAdded,
        Self::TaskCompleted,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskUpdated => "task_updated",
            Self::CommentAdded => "comment_added",
            Self::TaskCompleted => "task_completed",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for NotificationType {
    type Error = ParseNotificationTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseNotificationTypeError(value.to_owned()))
    }
}

/// Idempotency key of a notification record.
///
/// Hex-encoded SHA-256 over the originating event id, the recipient, and
/// the notification type. Two deliveries of the same event map to the same
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// Derives the key for one recipient of one event.
    #[must_use]
    pub fn derive(event_id: Uuid, user_id: UserId, kind: NotificationType) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(event_id.as_bytes());
        hasher.update(user_id.into_inner().as_bytes());
        hasher.update(kind.as_str().as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            for nibble in [byte >> 4, byte & 0x0f] {
                hex.push(char::from_digit(u32::from(nibble), 16).unwrap_or('0'));
            }
        }
        Self(hex)
    }

    /// Wraps a key read back from storage.
    #[must_use]
    pub const fn from_persisted(value: String) -> Self {
        Self(value)
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A notification addressed to one user.
///
/// Records are immutable apart from the read flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    id: NotificationId,
    user_id: UserId,
    kind: NotificationType,
    message: String,
    related_task_id: Option<TaskId>,
    read: bool,
    dedupe_key: DedupeKey,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a stored notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNotificationData {
    /// Record identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Notification type.
    pub kind: NotificationType,
    /// Rendered message.
    pub message: String,
    /// Task the notification refers to.
    pub related_task_id: Option<TaskId>,
    /// Read flag.
    pub read: bool,
    /// Idempotency key.
    pub dedupe_key: DedupeKey,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Creates an unread notification.
    #[must_use]
    pub fn new(
        dedupe_key: DedupeKey,
        user_id: UserId,
        kind: NotificationType,
        message: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            message: message.into(),
            related_task_id: None,
            read: false,
            dedupe_key,
            created_at: clock.utc(),
        }
    }

    /// Links the notification to a task.
    #[must_use]
    pub const fn with_related_task(mut self, task_id: TaskId) -> Self {
        self.related_task_id = Some(task_id);
        self
    }

    /// Reconstructs a stored notification.
    #[must_use]
    pub fn from_persisted(data: PersistedNotificationData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            kind: data.kind,
            message: data.message,
            related_task_id: data.related_task_id,
            read: data.read,
            dedupe_key: data.dedupe_key,
            created_at: data.created_at,
        }
    }

    /// Marks the notification read. Returns whether the flag changed.
    pub const fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the notification type.
    #[must_use]
    pub const fn kind(&self) -> NotificationType {
        self.kind
    }

    /// Returns the rendered message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the related task, if any.
    #[must_use]
    pub const fn related_task_id(&self) -> Option<TaskId> {
        self.related_task_id
    }

    /// Whether the recipient has read the notification.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read
    }

    /// Returns the idempotency key.
    #[must_use]
    pub const fn dedupe_key(&self) -> &DedupeKey {
        &self.dedupe_key
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One window of a user's notifications, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage<T> {
    /// Notifications in the window.
    pub items: Vec<T>,
    /// Total notifications for the user.
    pub total: u64,
    /// Requested window size.
    pub limit: u32,
    /// Requested window start.
    pub offset: u32,
}

impl<T> NotificationPage<T> {
    /// Converts every item, keeping the window metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> NotificationPage<U> {
        NotificationPage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
