//! Parse errors for notification value types.

use thiserror::Error;

/// Error returned when a notification type string is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown notification type: {0}")]
pub struct ParseNotificationTypeError(pub String);
