//! Notification records and the event payloads they are derived from.

mod error;
mod events;
mod ids;
mod notification;

pub use error::ParseNotificationTypeError;
pub use events::{CommentEventPayload, TaskEventPayload};
pub use ids::NotificationId;
pub use notification::{
    DedupeKey, NotificationPage, NotificationRecord, NotificationType, PersistedNotificationData,
};
