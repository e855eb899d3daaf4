//! Notification service errors.

use crate::broker::domain::RoutingKey;
use crate::notification::{domain::NotificationType, ports::NotificationRepositoryError};
use thiserror::Error;

/// Errors raised while deriving, storing, or querying notifications.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The notification store failed.
    #[error(transparent)]
    Repository(#[from] NotificationRepositoryError),

    /// A message template failed to render.
    #[error("failed to render {kind} message: {reason}")]
    Template {
        /// Notification type whose template failed.
        kind: NotificationType,
        /// Renderer diagnostic.
        reason: String,
    },

    /// An event body did not match the expected shape.
    #[error("malformed {routing_key} payload: {reason}")]
    Payload {
        /// Routing key of the rejected event.
        routing_key: RoutingKey,
        /// Decoder diagnostic.
        reason: String,
    },
}

impl NotificationError {
    /// Whether retrying the same event could succeed.
    ///
    /// Only storage failures are transient; a bad payload or template fails
    /// the same way on every delivery.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Repository(_))
    }
}
