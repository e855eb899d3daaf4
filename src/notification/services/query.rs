//! Read and acknowledge notifications on behalf of their recipient.

use std::sync::Arc;

use crate::notification::{
    NotificationError,
    domain::{NotificationId, NotificationPage, NotificationRecord},
    ports::NotificationRepository,
};
use crate::task::domain::UserId;

/// Window size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest window a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Notification queries scoped to one recipient.
pub struct NotificationService<R: NotificationRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: NotificationRepository + ?Sized> NotificationService<R> {
    /// Creates a service over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Lists notifications of `user`, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_LIMIT`] (also used for zero) and is
    /// capped at [`MAX_LIMIT`]; `offset` defaults to zero.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Repository`] when storage fails.
    pub async fn list(
        &self,
        user: UserId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<NotificationPage<NotificationRecord>, NotificationError> {
        let window = limit
            .filter(|requested| *requested > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let start = offset.unwrap_or_default();
        let (items, total) = self.repository.list_for_user(user, window, start).await?;
        Ok(NotificationPage {
            items,
            total,
            limit: window,
            offset: start,
        })
    }

    /// Returns one notification of `user`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Repository`] when storage fails.
    pub async fn get(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<NotificationRecord>, NotificationError> {
        Ok(self.repository.find(id, user).await?)
    }

    /// Marks one notification read and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Repository`] when storage fails.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<NotificationRecord>, NotificationError> {
        let updated = self.repository.mark_read(id, user).await?;
        if updated.is_some() {
            tracing::debug!(notification_id = %id, %user, "notification marked read");
        }
        Ok(updated)
    }

    /// Marks every notification of `user` read.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Repository`] when storage fails.
    pub async fn mark_all_read(&self, user: UserId) -> Result<u64, NotificationError> {
        let changed = self.repository.mark_all_read(user).await?;
        tracing::debug!(%user, changed, "notifications marked read");
        Ok(changed)
    }

    /// Deletes one notification of `user`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Repository`] when storage fails.
    pub async fn delete(&self, id: NotificationId, user: UserId) -> Result<bool, NotificationError> {
        Ok(self.repository.delete(id, user).await?)
    }
}
