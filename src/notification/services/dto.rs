//! Wire payloads for the `notifications.*` request patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::domain::{NotificationId, NotificationRecord, NotificationType};
use crate::task::domain::{TaskId, UserId};

/// Payload of `notification.get_by_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsPayload {
    /// Recipient.
    pub user_id: UserId,
    /// Window size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Window start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Payload of the single-notification patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRefPayload {
    /// Target notification.
    #[serde(alias = "id")]
    pub notification_id: NotificationId,
    /// Recipient the notification must belong to.
    pub user_id: UserId,
}

/// Payload of `notification.mark_all_as_read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    /// Recipient.
    pub user_id: UserId,
}

/// Notification as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Record identifier.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Notification type.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Rendered message.
    pub message: String,
    /// Related task, if any.
    pub related_task_id: Option<TaskId>,
    /// Read flag.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&NotificationRecord> for NotificationResponse {
    fn from(record: &NotificationRecord) -> Self {
        Self {
            id: record.id(),
            user_id: record.user_id(),
            kind: record.kind(),
            message: record.message().to_owned(),
            related_task_id: record.related_task_id(),
            is_read: record.is_read(),
            created_at: record.created_at(),
        }
    }
}

/// Acknowledgement returned by bulk and delete operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always `true` when the call succeeded.
    pub success: bool,
}

impl SuccessResponse {
    /// A successful acknowledgement.
    pub const OK: Self = Self { success: true };
}
