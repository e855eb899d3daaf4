//! Ports for notification persistence.

mod repository;

#[cfg(test)]
pub use repository::MockNotificationRepository;
pub use repository::{
    NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult,
};
