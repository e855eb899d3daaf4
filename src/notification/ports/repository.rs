//! Repository port for notification records.

use crate::notification::domain::{NotificationId, NotificationRecord};
use crate::task::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification repository operations.
pub type NotificationRepositoryResult<T> = Result<T, NotificationRepositoryError>;

/// Notification persistence contract.
///
/// Lookups and mutations are scoped to the recipient: a record belonging to
/// another user behaves as if it did not exist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores `records` in one unit of work.
    ///
    /// Records whose dedupe key is already stored are skipped. Returns how
    /// many records were newly stored.
    async fn insert(&self, records: &[NotificationRecord]) -> NotificationRepositoryResult<usize>;

    /// Returns up to `limit` notifications of `user` starting at `offset`,
    /// newest first, plus the user's total count.
    async fn list_for_user(
        &self,
        user: UserId,
        limit: u32,
        offset: u32,
    ) -> NotificationRepositoryResult<(Vec<NotificationRecord>, u64)>;

    /// Finds one notification of `user`.
    async fn find(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>>;

    /// Marks one notification of `user` read and returns it.
    ///
    /// Returns `None` when no such notification exists.
    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> NotificationRepositoryResult<Option<NotificationRecord>>;

    /// Marks every unread notification of `user` read. Returns how many
    /// changed.
    async fn mark_all_read(&self, user: UserId) -> NotificationRepositoryResult<u64>;

    /// Deletes one notification of `user`. Returns whether it existed.
    async fn delete(&self, id: NotificationId, user: UserId) -> NotificationRepositoryResult<bool>;
}

/// Errors returned by notification repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
