//! Notification fan-out, consumption, and query services.

mod consumer;
mod dto;
mod error;
mod fan_out;
mod handler;
mod query;
mod templates;

pub use consumer::{DEFAULT_CONCURRENCY, FailurePolicy, FanOutConsumer};
pub use dto::{
    ListNotificationsPayload, NotificationRefPayload, NotificationResponse, SuccessResponse,
    UserPayload,
};
pub use error::NotificationError;
pub use fan_out::{FanOutSettings, NotificationFanOut};
pub use handler::NotificationRequestHandler;
pub use query::{DEFAULT_LIMIT, MAX_LIMIT, NotificationService};
pub use templates::MessageTemplates;
